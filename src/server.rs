//! HTTP server initialization and runtime setup.
//!
//! Builds the configured link repository, wires services into the router and
//! runs the Axum server until a shutdown signal arrives.

use crate::application::services::{AuthService, LinkService};
use crate::config::{Config, StorageBackend, mask_connection_string};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::persistence::{
    FileLinkRepository, MemoryLinkRepository, PgLinkRepository,
};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::build_generator;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Opens the storage backend selected by `config`.
///
/// PostgreSQL pools are connected and migrated before returning.
///
/// # Errors
///
/// Returns an error if the database is unreachable or migrations fail.
pub async fn build_repository(config: &Config) -> Result<Arc<dyn LinkRepository>> {
    Ok(match config.storage() {
        StorageBackend::Postgres(dsn) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .connect(&dsn)
                .await
                .with_context(|| {
                    format!("Failed to connect to {}", mask_connection_string(&dsn))
                })?;
            tracing::info!("Connected to database");

            let repository = PgLinkRepository::new(Arc::new(pool));
            repository
                .migrate()
                .await
                .context("Failed to apply migrations")?;
            Arc::new(repository)
        }
        StorageBackend::File(path) => {
            tracing::info!("Using file storage at {}", path.display());
            Arc::new(FileLinkRepository::new(path))
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Arc::new(MemoryLinkRepository::new())
        }
    })
}

/// Builds the link service on top of `repository`.
///
/// # Errors
///
/// Returns an error for an invalid code length or base URL.
pub fn build_link_service(
    config: &Config,
    repository: Arc<dyn LinkRepository>,
) -> Result<LinkService> {
    let generator = build_generator(config.code_generator, config.code_length)?;
    Ok(LinkService::new(repository, generator, &config.base_url)?)
}

/// Normalizes `:port` listen addresses to all interfaces.
fn bind_address(server_address: &str) -> String {
    if server_address.starts_with(':') {
        format!("0.0.0.0{server_address}")
    } else {
        server_address.to_string()
    }
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - the storage backend cannot be opened
/// - the listen address cannot be bound
/// - the server fails while running
pub async fn run(config: Config) -> Result<()> {
    let repository = build_repository(&config).await?;
    let link_service = build_link_service(&config, repository)?;

    let state = AppState {
        link_service: Arc::new(link_service),
        auth_service: Arc::new(AuthService::new(config.auth_secret.clone())),
        cookie_secure: config.cookie_secure,
        store_timeout: config.store_timeout,
    };

    let app = app_router(state);

    let addr = bind_address(&config.server_address);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    tracing::info!("Shutdown signal received");
}
