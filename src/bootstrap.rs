//! Process lifecycle: connect, set up the schema, serve, shut down.

use anyhow::Context;
use axum::Router;
use bookstore_db::Database;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Open the configured database.
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    Database::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.database.url))
}

/// Registry with every application module bound to `db`.
pub fn build_registry(db: &Database, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db, settings);
    registry
}

/// Apply pending schema setup and return the fully layered router.
///
/// Module `init`/`start` hooks are not run; this is the in-process entry used by
/// tests and embedders that drive the router directly.
pub async fn build_app(db: &Database, settings: &Settings) -> anyhow::Result<Router> {
    let registry = build_registry(db, settings);
    registry.apply_migrations(db).await?;
    Ok(bookstore_http::build_router(&registry, settings))
}

/// Apply pending schema setup and exit. Returns how many migrations ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = connect(settings).await?;
    let registry = build_registry(&db, settings);
    let applied = registry.apply_migrations(&db).await;
    db.close().await;
    applied
}

/// Run the service until Ctrl-C or SIGTERM.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let registry = build_registry(&db, settings);
    let ctx = InitCtx {
        settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    registry
        .apply_migrations(&db)
        .await
        .context("schema setup failed")?;
    registry.start_modules(&ctx).await?;

    let served = bookstore_http::start_server(&registry, settings, shutdown_signal()).await;

    let stopped = registry.stop_modules().await;
    db.close().await;

    served?;
    stopped
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
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
