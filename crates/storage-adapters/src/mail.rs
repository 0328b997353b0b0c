//! # Mail backends
//!
//! `LogMailer` emits each message as a tracing event; `FileMailer` drops one
//! plain-text file per message into a directory, named by send time and the
//! SHA-256 of the content so that repeated sends never overwrite each other.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use domains::{AppError, Email, Mailer, Result};
use sha2::{Digest, Sha256};
use tokio::fs;

#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<()> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "outgoing mail"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn render(email: &Email) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}\n",
            email.from, email.to, email.subject, email.body
        )
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, email: Email) -> Result<()> {
        let content = Self::render(&email);
        let digest = hex::encode(Sha256::digest(content.as_bytes()));
        let name = format!("{}-{}.eml", Utc::now().format("%Y%m%d-%H%M%S%.6f"), &digest[..12]);
        let path = self.dir.join(name);

        fs::create_dir_all(&self.dir)
            .await
            .map_err(AppError::internal)?;
        fs::write(&path, content).await.map_err(AppError::internal)?;
        tracing::debug!(to = %email.to, path = %path.display(), "mail written");
        Ok(())
    }
}
