//! Batch inserts for the CSV loader. Each call runs in one transaction and
//! moves the table's id sequence past the highest imported id.

use async_trait::async_trait;
use domains::{
    BulkLoader, CommentRecord, GenreLink, Result, ReviewRecord, TaxonomyKind, Term, TitleRecord,
    User,
};
use sqlx::{Postgres, QueryBuilder, Transaction};

use super::{db_error, term_table, PgStore};

/// Rows per INSERT statement; keeps the bind count under the protocol limit.
const CHUNK: usize = 1000;

async fn reset_sequence(tx: &mut Transaction<'_, Postgres>, table: &str) -> Result<()> {
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
            COALESCE((SELECT MAX(id) FROM {table}), 1), \
            (SELECT COUNT(*) > 0 FROM {table}))"
    );
    sqlx::query(&sql)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    Ok(())
}

async fn insert_chunks<T>(
    tx: &mut Transaction<'_, Postgres>,
    head: &str,
    rows: &[T],
    push: impl Fn(sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>, &T) + Copy,
) -> Result<u64> {
    let mut written = 0;
    for chunk in rows.chunks(CHUNK) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(head);
        builder.push_values(chunk, |b, row| push(b, row));
        written += builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(db_error)?
            .rows_affected();
    }
    Ok(written)
}

#[async_trait]
impl BulkLoader for PgStore {
    async fn load_users(&self, rows: Vec<User>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let n = insert_chunks(
            &mut tx,
            "INSERT INTO users (id, username, email, role, bio, first_name, last_name) ",
            &rows,
            |mut b, u: &User| {
                b.push_bind(u.id)
                    .push_bind(u.username.clone())
                    .push_bind(u.email.clone())
                    .push_bind(u.role.as_str())
                    .push_bind(u.bio.clone())
                    .push_bind(u.first_name.clone())
                    .push_bind(u.last_name.clone());
            },
        )
        .await?;
        reset_sequence(&mut tx, "users").await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }

    async fn load_terms(&self, kind: TaxonomyKind, rows: Vec<Term>) -> Result<u64> {
        let table = term_table(kind);
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let head = format!("INSERT INTO {table} (id, name, slug) ");
        let n = insert_chunks(&mut tx, &head, &rows, |mut b, t: &Term| {
            b.push_bind(t.id)
                .push_bind(t.name.clone())
                .push_bind(t.slug.clone());
        })
        .await?;
        reset_sequence(&mut tx, table).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }

    async fn load_titles(&self, rows: Vec<TitleRecord>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let n = insert_chunks(
            &mut tx,
            "INSERT INTO titles (id, name, year, description, category_id) ",
            &rows,
            |mut b, t: &TitleRecord| {
                b.push_bind(t.id)
                    .push_bind(t.name.clone())
                    .push_bind(t.year)
                    .push_bind(t.description.clone())
                    .push_bind(t.category_id);
            },
        )
        .await?;
        reset_sequence(&mut tx, "titles").await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }

    async fn load_genre_links(&self, rows: Vec<GenreLink>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let n = insert_chunks(
            &mut tx,
            "INSERT INTO title_genres (title_id, genre_id) ",
            &rows,
            |mut b, l: &GenreLink| {
                b.push_bind(l.title_id).push_bind(l.genre_id);
            },
        )
        .await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }

    async fn load_reviews(&self, rows: Vec<ReviewRecord>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let n = insert_chunks(
            &mut tx,
            "INSERT INTO reviews (id, title_id, author_id, text, score, pub_date) ",
            &rows,
            |mut b, r: &ReviewRecord| {
                b.push_bind(r.id)
                    .push_bind(r.title_id)
                    .push_bind(r.author_id)
                    .push_bind(r.text.clone())
                    .push_bind(r.score)
                    .push_bind(r.pub_date);
            },
        )
        .await?;
        reset_sequence(&mut tx, "reviews").await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }

    async fn load_comments(&self, rows: Vec<CommentRecord>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let n = insert_chunks(
            &mut tx,
            "INSERT INTO comments (id, review_id, author_id, text, pub_date) ",
            &rows,
            |mut b, c: &CommentRecord| {
                b.push_bind(c.id)
                    .push_bind(c.review_id)
                    .push_bind(c.author_id)
                    .push_bind(c.text.clone())
                    .push_bind(c.pub_date);
            },
        )
        .await?;
        reset_sequence(&mut tx, "comments").await?;
        tx.commit().await.map_err(db_error)?;
        Ok(n)
    }
}
