//! # Core Traits (Ports)
//!
//! Every store, mailer and token backend plugs in by implementing these.
//! Store adapters report key collisions as [`AppError::Conflict`] and missing
//! rows on update/delete as [`AppError::NotFound`].
//!
//! [`AppError::Conflict`]: crate::error::AppError::Conflict
//! [`AppError::NotFound`]: crate::error::AppError::NotFound

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Comment, CommentRecord, Email, GenreLink, Id, NewComment, NewReview, NewTerm, NewTitle,
    NewUser, Review, ReviewPatch, ReviewRecord, TaxonomyKind, Term, TitleDetail, TitlePatch,
    TitleRecord, User, UserPatch,
};
use crate::query::{Page, PageRequest, TitleFilter};

/// User accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: Id) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Ordered by id; `search` is a case-insensitive username substring.
    async fn list_users(&self, search: Option<String>, page: PageRequest) -> Result<Page<User>>;
    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<User>;
    async fn set_last_login(&self, id: Id, at: DateTime<Utc>) -> Result<()>;
    /// Cascades to the user's reviews and comments.
    async fn delete_user(&self, id: Id) -> Result<()>;
}

/// Categories and genres.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    async fn create_term(&self, kind: TaxonomyKind, term: NewTerm) -> Result<Term>;
    async fn find_term(&self, kind: TaxonomyKind, slug: &str) -> Result<Option<Term>>;
    /// Ordered by id; `search` is a case-insensitive name substring.
    async fn list_terms(
        &self,
        kind: TaxonomyKind,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Term>>;
    /// A category still referenced by a title is protected and yields `Conflict`;
    /// a genre is unlinked from its titles.
    async fn delete_term(&self, kind: TaxonomyKind, slug: &str) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TitleRepo: Send + Sync {
    async fn create_title(&self, title: NewTitle) -> Result<Id>;
    async fn get_title(&self, id: Id) -> Result<Option<TitleDetail>>;
    /// Ordered by rating ascending with unrated titles last, then by id.
    async fn list_titles(&self, filter: TitleFilter, page: PageRequest)
        -> Result<Page<TitleDetail>>;
    async fn update_title(&self, id: Id, patch: TitlePatch) -> Result<()>;
    /// Cascades to reviews and, through them, to comments.
    async fn delete_title(&self, id: Id) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// A second review by the same author for the same title yields `Conflict`.
    async fn create_review(&self, review: NewReview) -> Result<Review>;
    /// Only returns the review when it belongs to `title_id`.
    async fn get_review(&self, title_id: Id, review_id: Id) -> Result<Option<Review>>;
    async fn find_by_author(&self, title_id: Id, author_id: Id) -> Result<Option<Review>>;
    async fn list_reviews(&self, title_id: Id, page: PageRequest) -> Result<Page<Review>>;
    async fn update_review(&self, review_id: Id, patch: ReviewPatch) -> Result<Review>;
    /// Cascades to the review's comments.
    async fn delete_review(&self, review_id: Id) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Only returns the comment when it belongs to `review_id`.
    async fn get_comment(&self, review_id: Id, comment_id: Id) -> Result<Option<Comment>>;
    async fn list_comments(&self, review_id: Id, page: PageRequest) -> Result<Page<Comment>>;
    async fn update_comment(&self, comment_id: Id, text: String) -> Result<Comment>;
    async fn delete_comment(&self, comment_id: Id) -> Result<()>;
}

/// Batch inserts used by the CSV loader. Rows keep their identifiers; each
/// call is one batch and returns the number of rows written.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BulkLoader: Send + Sync {
    async fn load_users(&self, rows: Vec<User>) -> Result<u64>;
    async fn load_terms(&self, kind: TaxonomyKind, rows: Vec<Term>) -> Result<u64>;
    async fn load_titles(&self, rows: Vec<TitleRecord>) -> Result<u64>;
    async fn load_genre_links(&self, rows: Vec<GenreLink>) -> Result<u64>;
    async fn load_reviews(&self, rows: Vec<ReviewRecord>) -> Result<u64>;
    async fn load_comments(&self, rows: Vec<CommentRecord>) -> Result<u64>;
}

/// Outgoing mail.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// Proof-of-mailbox codes bound to the current state of a user record.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ConfirmationCodes: Send + Sync {
    fn make_code(&self, user: &User) -> String;
    /// False for codes that are malformed, expired, or minted before the
    /// user record last changed.
    fn check_code(&self, user: &User, code: &str) -> bool;
}

/// Signed bearer tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AccessTokens: Send + Sync {
    fn issue(&self, user: &User) -> Result<String>;
    /// Returns the id of the user the token was issued for.
    fn verify(&self, token: &str) -> Result<Id>;
}
