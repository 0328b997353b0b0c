//! One-shot CSV loader for seeding a fresh store.
//!
//! Each file holds one entity type with a header row. Columns named after a
//! relation (`category`, `author`) carry the related id and are renamed to
//! their `*_id` form before decoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use domains::{
    AppError, BulkLoader, CommentRecord, GenreLink, ReviewRecord, TaxonomyKind, Term,
    TitleRecord, User, UserRecord,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const FOREIGN_KEY_FIELDS: [&str; 2] = ["category", "author"];

pub const USERS_FILE: &str = "users.csv";
pub const CATEGORY_FILE: &str = "category.csv";
pub const GENRE_FILE: &str = "genre.csv";
pub const TITLES_FILE: &str = "titles.csv";
pub const GENRE_TITLE_FILE: &str = "genre_title.csv";
pub const REVIEW_FILE: &str = "review.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("{file}: {source}")]
    Store {
        file: String,
        #[source]
        source: AppError,
    },
}

/// Rows written per file, in load order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub loaded: Vec<(String, u64)>,
}

impl ImportReport {
    pub fn total(&self) -> u64 {
        self.loaded.iter().map(|(_, n)| n).sum()
    }

    fn record(&mut self, file: &str, written: domains::Result<u64>) -> Result<(), ImportError> {
        let n = written.map_err(|source| ImportError::Store {
            file: file.to_string(),
            source,
        })?;
        tracing::info!(file, rows = n, "file imported");
        self.loaded.push((file.to_string(), n));
        Ok(())
    }
}

pub struct CsvImporter {
    loader: Arc<dyn BulkLoader>,
}

impl CsvImporter {
    pub fn new(loader: Arc<dyn BulkLoader>) -> Self {
        Self { loader }
    }

    /// Loads every file under `dir`. Stops at the first failure; rows already
    /// written by earlier files stay.
    pub async fn run(&self, dir: &Path) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        let users: Vec<User> = read_rows::<UserRecord>(dir, USERS_FILE).await?
            .into_iter()
            .map(User::from)
            .collect();
        let n = self.loader.load_users(users).await;
        report.record(USERS_FILE, n)?;

        for (file, kind) in [
            (CATEGORY_FILE, TaxonomyKind::Category),
            (GENRE_FILE, TaxonomyKind::Genre),
        ] {
            let rows = read_rows::<Term>(dir, file).await?;
            let n = self.loader.load_terms(kind, rows).await;
            report.record(file, n)?;
        }

        let rows = read_rows::<TitleRecord>(dir, TITLES_FILE).await?;
        let n = self.loader.load_titles(rows).await;
        report.record(TITLES_FILE, n)?;

        let links = dir.join(GENRE_TITLE_FILE);
        let has_links = tokio::fs::try_exists(&links)
            .await
            .map_err(|source| ImportError::Io { path: links, source })?;
        if has_links {
            let rows = read_rows::<GenreLink>(dir, GENRE_TITLE_FILE).await?;
            let n = self.loader.load_genre_links(rows).await;
            report.record(GENRE_TITLE_FILE, n)?;
        }

        let rows = read_rows::<ReviewRecord>(dir, REVIEW_FILE).await?;
        let n = self.loader.load_reviews(rows).await;
        report.record(REVIEW_FILE, n)?;

        let rows = read_rows::<CommentRecord>(dir, COMMENTS_FILE).await?;
        let n = self.loader.load_comments(rows).await;
        report.record(COMMENTS_FILE, n)?;

        tracing::info!(rows = report.total(), dir = %dir.display(), "import finished");
        Ok(report)
    }
}

/// `category` -> `category_id`, `author` -> `author_id`; other names pass.
pub fn remap_header(name: &str) -> String {
    if FOREIGN_KEY_FIELDS.contains(&name) {
        format!("{name}_id")
    } else {
        name.to_string()
    }
}

async fn read_rows<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, ImportError> {
    let path = dir.join(file);
    let content = tokio::fs::read(&path)
        .await
        .map_err(|source| ImportError::Io { path, source })?;
    parse_rows(content.as_slice(), file)
}

fn parse_rows<T: DeserializeOwned, R: std::io::Read>(
    input: R,
    file: &str,
) -> Result<Vec<T>, ImportError> {
    let csv_err = |source: csv::Error| ImportError::Csv {
        file: file.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers: csv::StringRecord = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(remap_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.deserialize(Some(&headers)).map_err(csv_err)?);
    }
    Ok(rows)
}
