//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the domain models.
//! Cascades and the category delete guard are enforced by foreign keys;
//! constraint violations surface as [`AppError::Conflict`].

mod bulk;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AppError, Comment, CommentRepo, Id, NewComment, NewReview, NewTerm, NewTitle, NewUser, Page,
    PageRequest, Result, Review, ReviewPatch, ReviewRepo, Role, TaxonomyKind, TaxonomyRepo, Term,
    TitleDetail, TitleFilter, TitlePatch, TitleRepo, User, UserPatch, UserRepo,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};

pub(crate) fn db_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            tracing::debug!(constraint = ?db.constraint(), message = %db.message(), "constraint violated");
            AppError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            AppError::Conflict(db.message().to_string())
        }
        _ => {
            tracing::error!(error = %err, "database operation failed");
            AppError::internal(err)
        }
    }
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn term_table(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Category => "categories",
        TaxonomyKind::Genre => "genres",
    }
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    (page.limit() as i64, page.offset() as i64)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(AppError::internal)?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

// ── Users ────────────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, username, email, role, bio, first_name, last_name, last_login";

#[derive(FromRow)]
struct UserRow {
    id: Id,
    username: String,
    email: String,
    role: String,
    bio: String,
    first_name: String,
    last_name: String,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role: Role::from_str(&row.role)
                .map_err(|_| AppError::internal(format!("stored role {:?} is unknown", row.role)))?,
            bio: row.bio,
            first_name: row.first_name,
            last_name: row.last_name,
            last_login: row.last_login,
        })
    }
}

impl PgStore {
    async fn fetch_user(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, email, role, bio, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.bio)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?
            .try_into()
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_user("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user("email", email).await
    }

    async fn list_users(&self, search: Option<String>, page: PageRequest) -> Result<Page<User>> {
        let pattern = search.as_deref().map(like_pattern);
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR username ILIKE $1)")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::text IS NULL OR username ILIKE $1) \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<User> {
        let sql = format!(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                email = COALESCE($3, email), \
                role = COALESCE($4, role), \
                bio = COALESCE($5, bio), \
                first_name = COALESCE($6, first_name), \
                last_name = COALESCE($7, last_name) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(patch.username)
            .bind(patch.email)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(patch.bio)
            .bind(patch.first_name)
            .bind(patch.last_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("user", id))?
            .try_into()
    }

    async fn set_last_login(&self, id: Id, at: DateTime<Utc>) -> Result<()> {
        let done = sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("user", id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Id) -> Result<()> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("user", id));
        }
        Ok(())
    }
}

// ── Categories and genres ────────────────────────────────────────────────────

#[derive(FromRow)]
struct TermRow {
    id: Id,
    name: String,
    slug: String,
}

impl From<TermRow> for Term {
    fn from(row: TermRow) -> Self {
        Term {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[async_trait]
impl TaxonomyRepo for PgStore {
    async fn create_term(&self, kind: TaxonomyKind, term: NewTerm) -> Result<Term> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            term_table(kind)
        );
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(&term.name)
            .bind(&term.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.into())
    }

    async fn find_term(&self, kind: TaxonomyKind, slug: &str) -> Result<Option<Term>> {
        let sql = format!(
            "SELECT id, name, slug FROM {} WHERE slug = $1",
            term_table(kind)
        );
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Term::from))
    }

    async fn list_terms(
        &self,
        kind: TaxonomyKind,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Term>> {
        let table = term_table(kind);
        let pattern = search.as_deref().map(like_pattern);
        let count_sql = format!("SELECT COUNT(*) FROM {table} WHERE ($1::text IS NULL OR name ILIKE $1)");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT id, name, slug FROM {table} WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, TermRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Term::from)
            .collect();
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn delete_term(&self, kind: TaxonomyKind, slug: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE slug = $1", term_table(kind));
        let done = sqlx::query(&sql)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found(kind.label(), slug));
        }
        Ok(())
    }
}

// ── Titles ───────────────────────────────────────────────────────────────────

const TITLE_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, \
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
        (SELECT AVG(r.score)::float8 FROM reviews r WHERE r.title_id = t.id) AS rating \
    FROM titles t LEFT JOIN categories c ON c.id = t.category_id";

const TITLE_FILTER: &str = "WHERE ($1::text IS NULL OR c.slug = $1) \
    AND ($2::text IS NULL OR EXISTS ( \
        SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
        WHERE tg.title_id = t.id AND g.slug = $2)) \
    AND ($3::text IS NULL OR t.name ILIKE $3) \
    AND ($4::int IS NULL OR t.year = $4)";

#[derive(FromRow)]
struct TitleRow {
    id: Id,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<Id>,
    category_name: Option<String>,
    category_slug: Option<String>,
    rating: Option<f64>,
}

#[derive(FromRow)]
struct TitleGenreRow {
    title_id: Id,
    id: Id,
    name: String,
    slug: String,
}

impl PgStore {
    /// Attaches genres to already fetched title rows, preserving their order.
    async fn with_genres(&self, rows: Vec<TitleRow>) -> Result<Vec<TitleDetail>> {
        let ids: Vec<Id> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, TitleGenreRow>(
            "SELECT tg.title_id, g.id, g.name, g.slug FROM title_genres tg \
             JOIN genres g ON g.id = tg.genre_id WHERE tg.title_id = ANY($1) ORDER BY g.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let genre = links
                    .iter()
                    .filter(|l| l.title_id == row.id)
                    .map(|l| Term {
                        id: l.id,
                        name: l.name.clone(),
                        slug: l.slug.clone(),
                    })
                    .collect();
                let category = match (row.category_id, row.category_name, row.category_slug) {
                    (Some(id), Some(name), Some(slug)) => Some(Term { id, name, slug }),
                    _ => None,
                };
                TitleDetail {
                    id: row.id,
                    name: row.name,
                    year: row.year,
                    description: row.description,
                    category,
                    genre,
                    rating: row.rating,
                }
            })
            .collect())
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        title_id: Id,
        genre_ids: &[Id],
    ) -> Result<()> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        if genre_ids.is_empty() {
            return Ok(());
        }
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO title_genres (title_id, genre_id) ");
        builder.push_values(genre_ids, |mut b, genre_id| {
            b.push_bind(title_id).push_bind(*genre_id);
        });
        builder.push(" ON CONFLICT DO NOTHING");
        builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl TitleRepo for PgStore {
    async fn create_title(&self, title: NewTitle) -> Result<Id> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let id: Id = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        Self::replace_genres(&mut tx, id, &title.genre_ids).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(id)
    }

    async fn get_title(&self, id: Id) -> Result<Option<TitleDetail>> {
        let sql = format!("{TITLE_SELECT} WHERE t.id = $1");
        let Some(row) = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };
        Ok(self.with_genres(vec![row]).await?.pop())
    }

    async fn list_titles(
        &self,
        filter: TitleFilter,
        page: PageRequest,
    ) -> Result<Page<TitleDetail>> {
        let name = filter.name.as_deref().map(like_pattern);
        let count_sql = format!(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id {TITLE_FILTER}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&filter.category)
            .bind(&filter.genre)
            .bind(&name)
            .bind(filter.year)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "{TITLE_SELECT} {TITLE_FILTER} ORDER BY rating ASC NULLS LAST, t.id LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(&filter.category)
            .bind(&filter.genre)
            .bind(&name)
            .bind(filter.year)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(Page {
            items: self.with_genres(rows).await?,
            total: total as u64,
        })
    }

    async fn update_title(&self, id: Id, patch: TitlePatch) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let (set_description, description) = match patch.description {
            Some(value) => (true, value),
            None => (false, None),
        };
        let done = sqlx::query(
            "UPDATE titles SET \
                name = COALESCE($2, name), \
                year = COALESCE($3, year), \
                description = CASE WHEN $4 THEN $5 ELSE description END, \
                category_id = COALESCE($6, category_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.year)
        .bind(set_description)
        .bind(description)
        .bind(patch.category_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("title", id));
        }
        if let Some(genre_ids) = patch.genre_ids {
            Self::replace_genres(&mut tx, id, &genre_ids).await?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_title(&self, id: Id) -> Result<()> {
        let done = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("title", id));
        }
        Ok(())
    }
}

// ── Reviews and comments ─────────────────────────────────────────────────────

const REVIEW_SELECT: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
        r.text, r.score, r.pub_date \
    FROM reviews r JOIN users u ON u.id = r.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.review_id, c.author_id, u.username AS author, \
        c.text, c.pub_date \
    FROM comments c JOIN users u ON u.id = c.author_id";

#[derive(FromRow)]
struct ReviewRow {
    id: Id,
    title_id: Id,
    author_id: Id,
    author: String,
    text: String,
    score: i32,
    pub_date: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            title_id: row.title_id,
            author_id: row.author_id,
            author: row.author,
            text: row.text,
            score: row.score,
            pub_date: row.pub_date,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Id,
    review_id: Id,
    author_id: Id,
    author: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            review_id: row.review_id,
            author_id: row.author_id,
            author: row.author,
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}

impl PgStore {
    async fn review_by_id(&self, review_id: Id) -> Result<Review> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Review::from)
            .ok_or_else(|| AppError::not_found("review", review_id))
    }

    async fn comment_by_id(&self, comment_id: Id) -> Result<Comment> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Comment::from)
            .ok_or_else(|| AppError::not_found("comment", comment_id))
    }
}

#[async_trait]
impl ReviewRepo for PgStore {
    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let id: Id = sqlx::query_scalar(
            "INSERT INTO reviews (title_id, author_id, text, score) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(review.title_id)
        .bind(review.author_id)
        .bind(&review.text)
        .bind(review.score)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        self.review_by_id(id).await
    }

    async fn get_review(&self, title_id: Id, review_id: Id) -> Result<Option<Review>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1 AND r.title_id = $2");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Review::from))
    }

    async fn find_by_author(&self, title_id: Id, author_id: Id) -> Result<Option<Review>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.title_id = $1 AND r.author_id = $2");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(title_id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Review::from))
    }

    async fn list_reviews(&self, title_id: Id, page: PageRequest) -> Result<Page<Review>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let (limit, offset) = page_bounds(page);
        let sql = format!("{REVIEW_SELECT} WHERE r.title_id = $1 ORDER BY r.id LIMIT $2 OFFSET $3");
        let items = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(title_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Review::from)
            .collect();
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_review(&self, review_id: Id, patch: ReviewPatch) -> Result<Review> {
        let done = sqlx::query(
            "UPDATE reviews SET text = COALESCE($2, text), score = COALESCE($3, score) WHERE id = $1",
        )
        .bind(review_id)
        .bind(patch.text)
        .bind(patch.score)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("review", review_id));
        }
        self.review_by_id(review_id).await
    }

    async fn delete_review(&self, review_id: Id) -> Result<()> {
        let done = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("review", review_id));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let id: Id = sqlx::query_scalar(
            "INSERT INTO comments (review_id, author_id, text) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(comment.review_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        self.comment_by_id(id).await
    }

    async fn get_comment(&self, review_id: Id, comment_id: Id) -> Result<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1 AND c.review_id = $2");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, review_id: Id, page: PageRequest) -> Result<Page<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let (limit, offset) = page_bounds(page);
        let sql =
            format!("{COMMENT_SELECT} WHERE c.review_id = $1 ORDER BY c.id LIMIT $2 OFFSET $3");
        let items = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(review_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Comment::from)
            .collect();
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_comment(&self, comment_id: Id, text: String) -> Result<Comment> {
        let done = sqlx::query("UPDATE comments SET text = $2 WHERE id = $1")
            .bind(comment_id)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("comment", comment_id));
        }
        self.comment_by_id(comment_id).await
    }

    async fn delete_comment(&self, comment_id: Id) -> Result<()> {
        let done = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("comment", comment_id));
        }
        Ok(())
    }
}
