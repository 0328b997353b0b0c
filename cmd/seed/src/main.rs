//! Management commands: CSV import and admin bootstrap.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use configs::Settings;
use services::{CsvImporter, UserService};

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "YaMDb data management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load users, categories, genres, titles, reviews and comments from CSV
    Import {
        /// Directory holding the CSV files [default: import.data_dir]
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Create an account with the admin role
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;
    configs::telemetry::init(&settings.log);

    let store = store::open(&settings).await?;
    match cli.command {
        Commands::Import { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&settings.import.data_dir));
            let report = CsvImporter::new(store)
                .run(&dir)
                .await
                .with_context(|| format!("importing from {}", dir.display()))?;
            for (file, rows) in &report.loaded {
                println!("{file}: {rows} rows");
            }
            println!("imported {} rows", report.total());
        }
        Commands::CreateAdmin { username, email } => {
            let user = UserService::new(store)
                .create_admin(username, email)
                .await
                .context("creating admin")?;
            println!("created admin {} <{}>", user.username, user.email);
        }
    }
    Ok(())
}

#[cfg(feature = "db-postgres")]
mod store {
    use std::sync::Arc;

    use anyhow::Context;
    use configs::{ExposeSecret, Settings};
    use storage_adapters::PgStore;

    pub async fn open(settings: &Settings) -> anyhow::Result<Arc<PgStore>> {
        let store = PgStore::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await
        .context("connecting to PostgreSQL")?;
        if settings.database.run_migrations {
            store.migrate().await.context("running migrations")?;
        }
        Ok(Arc::new(store))
    }
}

/// Without a database the commands run against a throwaway store, which
/// still checks the files and their references.
#[cfg(not(feature = "db-postgres"))]
mod store {
    use std::sync::Arc;

    use configs::Settings;
    use storage_adapters::MemoryStore;

    pub async fn open(_settings: &Settings) -> anyhow::Result<Arc<MemoryStore>> {
        tracing::warn!("db-postgres disabled; nothing will be persisted");
        Ok(Arc::new(MemoryStore::new()))
    }
}
