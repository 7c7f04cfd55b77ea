// Book Themes server binary

use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;

use book_themes_lib::config::{init_logging, ServerArgs, ServerConfig};
use book_themes_lib::db::{init_data_folders, open_db};
use book_themes_lib::gateway::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_logging(&args.log_level);

    let config = ServerConfig::from_args(&args)?;
    init_data_folders(&config.data_dir)
        .with_context(|| format!("Failed to prepare data directory {}", config.data_dir.display()))?;

    let state = Arc::new(AppState::new(config));

    // Migrate once up front so a bad schema fails startup, not the first request
    let conn = open_db(&state.config.db_path())?;
    match state.service.reconcile_assets(&conn) {
        Ok(report) => {
            if !report.removed_orphans.is_empty() || !report.missing_files.is_empty() {
                log::warn!(
                    "Startup reconcile: removed {} orphaned files, {} themes missing files",
                    report.removed_orphans.len(),
                    report.missing_files.len()
                );
            }
        }
        Err(e) => log::error!("Startup reconcile failed: {}", e),
    }
    drop(conn);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    log::info!(
        "Book themes listening on {} (data: {})",
        args.bind,
        state.config.data_dir.display()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Book themes stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
