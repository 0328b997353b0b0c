//! # Domain Models
//!
//! These structs represent the core entities of the review site.
//! Identifiers are store-assigned 64-bit integers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub type Id = i64;

/// Access level of a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::invalid("role", format!("\"{s}\" is not a valid choice.")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    /// Stamped on every successful token exchange; feeds the confirmation-code hash
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// A plain `user`-role account with empty profile fields, as created by signup.
    pub fn basic(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role: Role::User,
            bio: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }
}

/// Partial update of a user. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Which of the two slug-keyed taxonomies a [`Term`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Category,
    Genre,
}

impl TaxonomyKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Genre => "genre",
        }
    }
}

/// A category or genre: a display name plus a unique slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

pub type Category = Term;
pub type Genre = Term;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerm {
    pub name: String,
    pub slug: String,
}

/// Title row as stored, with relations held as identifiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TitleRecord {
    pub id: Id,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<Id>,
    pub genre_ids: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitlePatch {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Id>,
    pub genre_ids: Option<Vec<Id>>,
}

/// Read model of a title: relations resolved and the average score attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleDetail {
    pub id: Id,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub genre: Vec<Genre>,
    /// Mean review score; `None` until the first review lands
    pub rating: Option<f64>,
}

/// Link row of the title/genre many-to-many relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GenreLink {
    pub title_id: Id,
    pub genre_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: Id,
    pub title_id: Id,
    pub author_id: Id,
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub title_id: Id,
    pub author_id: Id,
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewRecord {
    pub id: Id,
    pub title_id: Id,
    pub author_id: Id,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Id,
    pub review_id: Id,
    pub author_id: Id,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub review_id: Id,
    pub author_id: Id,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommentRecord {
    pub id: Id,
    pub review_id: Id,
    pub author_id: Id,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

/// User row as it appears in the import files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            role: record.role,
            bio: record.bio,
            first_name: record.first_name,
            last_name: record.last_name,
            last_login: None,
        }
    }
}

/// An outgoing plain-text mail message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}
