//! YaMDb server: loads settings, wires the adapters and serves the API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, Ports};
use auth_adapters::{HmacCodes, JwtTokens};
use configs::{ExposeSecret, MailBackend, Settings};
use domains::Mailer;
use storage_adapters::{FileMailer, LogMailer};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    configs::telemetry::init(&settings.log);

    if settings.uses_dev_secret() {
        tracing::warn!("auth.secret_key is the development default; set YAMDB__AUTH__SECRET_KEY");
    }

    let secret = settings.auth.secret_key.expose_secret().as_bytes().to_vec();
    let codes = Arc::new(HmacCodes::new(
        &secret,
        chrono::Duration::seconds(settings.auth.confirmation_code_ttl_secs),
    ));
    let tokens = Arc::new(JwtTokens::new(
        &secret,
        chrono::Duration::seconds(settings.auth.access_token_ttl_secs),
    ));
    let mailer: Arc<dyn Mailer> = match settings.mail.backend {
        MailBackend::Log => Arc::new(LogMailer),
        MailBackend::File => Arc::new(FileMailer::new(&settings.mail.file_path)),
    };

    let ports = Ports::from_store(open_store(&settings).await?, codes, tokens, mailer);
    let state = AppState::new(ports, settings.api.page_size, settings.mail.from_address.clone());

    let addr = settings.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

#[cfg(feature = "db-postgres")]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<storage_adapters::PgStore>> {
    let store = storage_adapters::PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to PostgreSQL")?;
    if settings.database.run_migrations {
        store.migrate().await.context("running migrations")?;
    }
    tracing::info!("using PostgreSQL store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_store(_settings: &Settings) -> anyhow::Result<Arc<storage_adapters::MemoryStore>> {
    tracing::warn!("db-postgres disabled; data lives in memory and is lost on exit");
    Ok(Arc::new(storage_adapters::MemoryStore::new()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
