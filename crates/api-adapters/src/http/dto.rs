//! Wire representations. Categories and genres never expose their id;
//! authors are rendered by username.

use chrono::{DateTime, Utc};
use domains::{Comment, Id, Review, Role, Term, TitleDetail, User};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TermView {
    pub name: String,
    pub slug: String,
}

impl From<Term> for TermView {
    fn from(term: Term) -> Self {
        Self {
            name: term.name,
            slug: term.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleView {
    pub id: Id,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<TermView>,
    pub category: Option<TermView>,
}

impl From<TitleDetail> for TitleView {
    fn from(title: TitleDetail) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            rating: title.rating,
            description: title.description,
            genre: title.genre.into_iter().map(TermView::from).collect(),
            category: title.category.map(TermView::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: Id,
    pub text: String,
    pub author: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            text: review.text,
            author: review.author,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Id,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}
