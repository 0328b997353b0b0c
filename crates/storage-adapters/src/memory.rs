//! # In-memory store
//!
//! Implements every repository port over a single lock-guarded state so that
//! cascades and uniqueness checks see one consistent snapshot. Backs the
//! integration tests and the server when no database feature is enabled.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AppError, BulkLoader, Comment, CommentRecord, CommentRepo, GenreLink, Id, NewComment,
    NewReview, NewTerm, NewTitle, NewUser, Page, PageRequest, Result, Review, ReviewPatch,
    ReviewRecord, ReviewRepo, TaxonomyKind, TaxonomyRepo, Term, TitleDetail, TitleFilter,
    TitlePatch, TitleRecord, TitleRepo, User, UserPatch, UserRepo,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Sequences {
    user: Id,
    category: Id,
    genre: Id,
    title: Id,
    review: Id,
    comment: Id,
}

fn next_id(counter: &mut Id) -> Id {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct State {
    users: BTreeMap<Id, User>,
    categories: BTreeMap<Id, Term>,
    genres: BTreeMap<Id, Term>,
    titles: BTreeMap<Id, TitleRecord>,
    /// (title_id, genre_id)
    title_genres: BTreeSet<(Id, Id)>,
    reviews: BTreeMap<Id, ReviewRecord>,
    comments: BTreeMap<Id, CommentRecord>,
    seq: Sequences,
}

impl State {
    fn terms(&self, kind: TaxonomyKind) -> &BTreeMap<Id, Term> {
        match kind {
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Genre => &self.genres,
        }
    }

    fn terms_mut(&mut self, kind: TaxonomyKind) -> (&mut BTreeMap<Id, Term>, &mut Id) {
        match kind {
            TaxonomyKind::Category => (&mut self.categories, &mut self.seq.category),
            TaxonomyKind::Genre => (&mut self.genres, &mut self.seq.genre),
        }
    }

    fn term_by_slug(&self, kind: TaxonomyKind, slug: &str) -> Option<&Term> {
        self.terms(kind).values().find(|t| t.slug == slug)
    }

    fn check_user_unique(&self, username: &str, email: &str, except: Option<Id>) -> Result<()> {
        let clash = self.users.values().find(|u| {
            Some(u.id) != except && (u.username == username || u.email == email)
        });
        match clash {
            Some(u) if u.username == username => {
                Err(AppError::Conflict(format!("username {username} is taken")))
            }
            Some(_) => Err(AppError::Conflict(format!("email {email} is taken"))),
            None => Ok(()),
        }
    }

    fn username(&self, id: Id) -> String {
        self.users
            .get(&id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn rating(&self, title_id: Id) -> Option<f64> {
        let scores: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.title_id == title_id)
            .map(|r| r.score)
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(f64::from(scores.iter().sum::<i32>()) / scores.len() as f64)
    }

    fn detail(&self, title: &TitleRecord) -> TitleDetail {
        let genre = self
            .title_genres
            .iter()
            .filter(|(t, _)| *t == title.id)
            .filter_map(|(_, g)| self.genres.get(g).cloned())
            .collect();
        TitleDetail {
            id: title.id,
            name: title.name.clone(),
            year: title.year,
            description: title.description.clone(),
            category: title
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            genre,
            rating: self.rating(title.id),
        }
    }

    fn review(&self, row: &ReviewRecord) -> Review {
        Review {
            id: row.id,
            title_id: row.title_id,
            author_id: row.author_id,
            author: self.username(row.author_id),
            text: row.text.clone(),
            score: row.score,
            pub_date: row.pub_date,
        }
    }

    fn comment(&self, row: &CommentRecord) -> Comment {
        Comment {
            id: row.id,
            review_id: row.review_id,
            author_id: row.author_id,
            author: self.username(row.author_id),
            text: row.text.clone(),
            pub_date: row.pub_date,
        }
    }

    fn remove_review(&mut self, review_id: Id) {
        self.comments.retain(|_, c| c.review_id != review_id);
        self.reviews.remove(&review_id);
    }

    fn remove_reviews_where(&mut self, pred: impl Fn(&ReviewRecord) -> bool) {
        let doomed: Vec<Id> = self
            .reviews
            .values()
            .filter(|r| pred(*r))
            .map(|r| r.id)
            .collect();
        for id in doomed {
            self.remove_review(id);
        }
    }

    fn check_review_unique(&self, title_id: Id, author_id: Id) -> Result<()> {
        if self
            .reviews
            .values()
            .any(|r| r.title_id == title_id && r.author_id == author_id)
        {
            return Err(AppError::Conflict(format!(
                "author {author_id} already reviewed title {title_id}"
            )));
        }
        Ok(())
    }
}

/// Ascending by rating with unrated titles last, ties broken by id.
fn by_rating(a: &TitleDetail, b: &TitleDetail) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then(a.id.cmp(&b.id))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        state.check_user_unique(&user.username, &user.email, None)?;
        let id = next_id(&mut state.seq.user);
        let created = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            bio: user.bio,
            first_name: user.first_name,
            last_name: user.last_name,
            last_login: None,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, search: Option<String>, page: PageRequest) -> Result<Page<User>> {
        let state = self.state.read().await;
        let all = state
            .users
            .values()
            .filter(|u| search.as_deref().is_none_or(|s| contains_ci(&u.username, s)))
            .cloned()
            .collect();
        Ok(Page::from_slice(all, page))
    }

    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<User> {
        let mut state = self.state.write().await;
        let current = state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("user", id))?;
        let username = patch.username.unwrap_or(current.username);
        let email = patch.email.unwrap_or(current.email);
        state.check_user_unique(&username, &email, Some(id))?;
        let updated = User {
            id,
            username,
            email,
            role: patch.role.unwrap_or(current.role),
            bio: patch.bio.unwrap_or(current.bio),
            first_name: patch.first_name.unwrap_or(current.first_name),
            last_name: patch.last_name.unwrap_or(current.last_name),
            last_login: current.last_login,
        };
        state.users.insert(id, updated.clone());
        Ok(updated)
    }

    async fn set_last_login(&self, id: Id, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("user", id))?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn delete_user(&self, id: Id) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(AppError::not_found("user", id));
        }
        state.remove_reviews_where(|r| r.author_id == id);
        state.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl TaxonomyRepo for MemoryStore {
    async fn create_term(&self, kind: TaxonomyKind, term: NewTerm) -> Result<Term> {
        let mut state = self.state.write().await;
        if state.term_by_slug(kind, &term.slug).is_some() {
            return Err(AppError::Conflict(format!(
                "{} slug {} is taken",
                kind.label(),
                term.slug
            )));
        }
        let (terms, seq) = state.terms_mut(kind);
        let id = next_id(seq);
        let created = Term {
            id,
            name: term.name,
            slug: term.slug,
        };
        terms.insert(id, created.clone());
        Ok(created)
    }

    async fn find_term(&self, kind: TaxonomyKind, slug: &str) -> Result<Option<Term>> {
        Ok(self.state.read().await.term_by_slug(kind, slug).cloned())
    }

    async fn list_terms(
        &self,
        kind: TaxonomyKind,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Term>> {
        let state = self.state.read().await;
        let all = state
            .terms(kind)
            .values()
            .filter(|t| search.as_deref().is_none_or(|s| contains_ci(&t.name, s)))
            .cloned()
            .collect();
        Ok(Page::from_slice(all, page))
    }

    async fn delete_term(&self, kind: TaxonomyKind, slug: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let id = state
            .term_by_slug(kind, slug)
            .map(|t| t.id)
            .ok_or_else(|| AppError::not_found(kind.label(), slug))?;
        match kind {
            TaxonomyKind::Category => {
                if state.titles.values().any(|t| t.category_id == Some(id)) {
                    return Err(AppError::Conflict(format!(
                        "category {slug} is still used by titles"
                    )));
                }
                state.categories.remove(&id);
            }
            TaxonomyKind::Genre => {
                state.title_genres.retain(|(_, g)| *g != id);
                state.genres.remove(&id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TitleRepo for MemoryStore {
    async fn create_title(&self, title: NewTitle) -> Result<Id> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.seq.title);
        state.titles.insert(
            id,
            TitleRecord {
                id,
                name: title.name,
                year: title.year,
                description: title.description,
                category_id: title.category_id,
            },
        );
        state
            .title_genres
            .extend(title.genre_ids.into_iter().map(|g| (id, g)));
        Ok(id)
    }

    async fn get_title(&self, id: Id) -> Result<Option<TitleDetail>> {
        let state = self.state.read().await;
        Ok(state.titles.get(&id).map(|t| state.detail(t)))
    }

    async fn list_titles(
        &self,
        filter: TitleFilter,
        page: PageRequest,
    ) -> Result<Page<TitleDetail>> {
        let state = self.state.read().await;
        let mut all: Vec<TitleDetail> = state
            .titles
            .values()
            .filter(|t| filter.year.is_none_or(|y| t.year == y))
            .filter(|t| filter.name.as_deref().is_none_or(|n| contains_ci(&t.name, n)))
            .map(|t| state.detail(t))
            .filter(|d| {
                filter.category.as_deref().is_none_or(|slug| {
                    d.category.as_ref().is_some_and(|c| c.slug == slug)
                })
            })
            .filter(|d| {
                filter
                    .genre
                    .as_deref()
                    .is_none_or(|slug| d.genre.iter().any(|g| g.slug == slug))
            })
            .collect();
        all.sort_by(by_rating);
        Ok(Page::from_slice(all, page))
    }

    async fn update_title(&self, id: Id, patch: TitlePatch) -> Result<()> {
        let mut state = self.state.write().await;
        let title = state
            .titles
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("title", id))?;
        if let Some(name) = patch.name {
            title.name = name;
        }
        if let Some(year) = patch.year {
            title.year = year;
        }
        if let Some(description) = patch.description {
            title.description = description;
        }
        if let Some(category_id) = patch.category_id {
            title.category_id = Some(category_id);
        }
        if let Some(genre_ids) = patch.genre_ids {
            state.title_genres.retain(|(t, _)| *t != id);
            state
                .title_genres
                .extend(genre_ids.into_iter().map(|g| (id, g)));
        }
        Ok(())
    }

    async fn delete_title(&self, id: Id) -> Result<()> {
        let mut state = self.state.write().await;
        if state.titles.remove(&id).is_none() {
            return Err(AppError::not_found("title", id));
        }
        state.title_genres.retain(|(t, _)| *t != id);
        state.remove_reviews_where(|r| r.title_id == id);
        Ok(())
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let mut state = self.state.write().await;
        state.check_review_unique(review.title_id, review.author_id)?;
        let id = next_id(&mut state.seq.review);
        let row = ReviewRecord {
            id,
            title_id: review.title_id,
            author_id: review.author_id,
            text: review.text,
            score: review.score,
            pub_date: Utc::now(),
        };
        let created = state.review(&row);
        state.reviews.insert(id, row);
        Ok(created)
    }

    async fn get_review(&self, title_id: Id, review_id: Id) -> Result<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .get(&review_id)
            .filter(|r| r.title_id == title_id)
            .map(|r| state.review(r)))
    }

    async fn find_by_author(&self, title_id: Id, author_id: Id) -> Result<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .find(|r| r.title_id == title_id && r.author_id == author_id)
            .map(|r| state.review(r)))
    }

    async fn list_reviews(&self, title_id: Id, page: PageRequest) -> Result<Page<Review>> {
        let state = self.state.read().await;
        let all = state
            .reviews
            .values()
            .filter(|r| r.title_id == title_id)
            .map(|r| state.review(r))
            .collect();
        Ok(Page::from_slice(all, page))
    }

    async fn update_review(&self, review_id: Id, patch: ReviewPatch) -> Result<Review> {
        let mut state = self.state.write().await;
        let row = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| AppError::not_found("review", review_id))?;
        if let Some(text) = patch.text {
            row.text = text;
        }
        if let Some(score) = patch.score {
            row.score = score;
        }
        let row = row.clone();
        Ok(state.review(&row))
    }

    async fn delete_review(&self, review_id: Id) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&review_id) {
            return Err(AppError::not_found("review", review_id));
        }
        state.remove_review(review_id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.seq.comment);
        let row = CommentRecord {
            id,
            review_id: comment.review_id,
            author_id: comment.author_id,
            text: comment.text,
            pub_date: Utc::now(),
        };
        let created = state.comment(&row);
        state.comments.insert(id, row);
        Ok(created)
    }

    async fn get_comment(&self, review_id: Id, comment_id: Id) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .get(&comment_id)
            .filter(|c| c.review_id == review_id)
            .map(|c| state.comment(c)))
    }

    async fn list_comments(&self, review_id: Id, page: PageRequest) -> Result<Page<Comment>> {
        let state = self.state.read().await;
        let all = state
            .comments
            .values()
            .filter(|c| c.review_id == review_id)
            .map(|c| state.comment(c))
            .collect();
        Ok(Page::from_slice(all, page))
    }

    async fn update_comment(&self, comment_id: Id, text: String) -> Result<Comment> {
        let mut state = self.state.write().await;
        let row = state
            .comments
            .get_mut(&comment_id)
            .ok_or_else(|| AppError::not_found("comment", comment_id))?;
        row.text = text;
        let row = row.clone();
        Ok(state.comment(&row))
    }

    async fn delete_comment(&self, comment_id: Id) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .comments
            .remove(&comment_id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("comment", comment_id))
    }
}

fn duplicate_id(entity: &str, id: Id) -> AppError {
    AppError::Conflict(format!("{entity} {id} already exists"))
}

fn missing_ref(entity: &str, id: Id) -> AppError {
    AppError::Conflict(format!("referenced {entity} {id} does not exist"))
}

/// Batch inserts keep the given ids and advance the sequences past them. A
/// batch is checked as a whole before any row lands.
#[async_trait]
impl BulkLoader for MemoryStore {
    async fn load_users(&self, rows: Vec<User>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut staged: BTreeMap<Id, User> = BTreeMap::new();
        for user in rows {
            if state.users.contains_key(&user.id) || staged.contains_key(&user.id) {
                return Err(duplicate_id("user", user.id));
            }
            state.check_user_unique(&user.username, &user.email, None)?;
            if staged
                .values()
                .any(|u| u.username == user.username || u.email == user.email)
            {
                return Err(AppError::Conflict(format!(
                    "user {} is listed twice",
                    user.username
                )));
            }
            staged.insert(user.id, user);
        }
        let n = staged.len() as u64;
        if let Some(max) = staged.keys().next_back() {
            state.seq.user = state.seq.user.max(*max);
        }
        state.users.extend(staged);
        Ok(n)
    }

    async fn load_terms(&self, kind: TaxonomyKind, rows: Vec<Term>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut staged: BTreeMap<Id, Term> = BTreeMap::new();
        for term in rows {
            let taken = state.term_by_slug(kind, &term.slug).is_some()
                || staged.values().any(|t| t.slug == term.slug);
            if state.terms(kind).contains_key(&term.id) || staged.contains_key(&term.id) {
                return Err(duplicate_id(kind.label(), term.id));
            }
            if taken {
                return Err(AppError::Conflict(format!(
                    "{} slug {} is taken",
                    kind.label(),
                    term.slug
                )));
            }
            staged.insert(term.id, term);
        }
        let n = staged.len() as u64;
        let (terms, seq) = state.terms_mut(kind);
        if let Some(max) = staged.keys().next_back() {
            *seq = (*seq).max(*max);
        }
        terms.extend(staged);
        Ok(n)
    }

    async fn load_titles(&self, rows: Vec<TitleRecord>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut staged: BTreeMap<Id, TitleRecord> = BTreeMap::new();
        for title in rows {
            if state.titles.contains_key(&title.id) || staged.contains_key(&title.id) {
                return Err(duplicate_id("title", title.id));
            }
            if let Some(category_id) = title.category_id {
                if !state.categories.contains_key(&category_id) {
                    return Err(missing_ref("category", category_id));
                }
            }
            staged.insert(title.id, title);
        }
        let n = staged.len() as u64;
        if let Some(max) = staged.keys().next_back() {
            state.seq.title = state.seq.title.max(*max);
        }
        state.titles.extend(staged);
        Ok(n)
    }

    async fn load_genre_links(&self, rows: Vec<GenreLink>) -> Result<u64> {
        let mut state = self.state.write().await;
        for link in &rows {
            if !state.titles.contains_key(&link.title_id) {
                return Err(missing_ref("title", link.title_id));
            }
            if !state.genres.contains_key(&link.genre_id) {
                return Err(missing_ref("genre", link.genre_id));
            }
        }
        let before = state.title_genres.len();
        state
            .title_genres
            .extend(rows.iter().map(|l| (l.title_id, l.genre_id)));
        Ok((state.title_genres.len() - before) as u64)
    }

    async fn load_reviews(&self, rows: Vec<ReviewRecord>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut staged: BTreeMap<Id, ReviewRecord> = BTreeMap::new();
        for review in rows {
            if state.reviews.contains_key(&review.id) || staged.contains_key(&review.id) {
                return Err(duplicate_id("review", review.id));
            }
            if !state.titles.contains_key(&review.title_id) {
                return Err(missing_ref("title", review.title_id));
            }
            if !state.users.contains_key(&review.author_id) {
                return Err(missing_ref("user", review.author_id));
            }
            state.check_review_unique(review.title_id, review.author_id)?;
            if staged
                .values()
                .any(|r| r.title_id == review.title_id && r.author_id == review.author_id)
            {
                return Err(AppError::Conflict(format!(
                    "author {} reviews title {} twice",
                    review.author_id, review.title_id
                )));
            }
            staged.insert(review.id, review);
        }
        let n = staged.len() as u64;
        if let Some(max) = staged.keys().next_back() {
            state.seq.review = state.seq.review.max(*max);
        }
        state.reviews.extend(staged);
        Ok(n)
    }

    async fn load_comments(&self, rows: Vec<CommentRecord>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut staged: BTreeMap<Id, CommentRecord> = BTreeMap::new();
        for comment in rows {
            if state.comments.contains_key(&comment.id) || staged.contains_key(&comment.id) {
                return Err(duplicate_id("comment", comment.id));
            }
            if !state.reviews.contains_key(&comment.review_id) {
                return Err(missing_ref("review", comment.review_id));
            }
            if !state.users.contains_key(&comment.author_id) {
                return Err(missing_ref("user", comment.author_id));
            }
            staged.insert(comment.id, comment);
        }
        let n = staged.len() as u64;
        if let Some(max) = staged.keys().next_back() {
            state.seq.comment = state.seq.comment.max(*max);
        }
        state.comments.extend(staged);
        Ok(n)
    }
}
