use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use holidays_api::{create_router, ApiConfig, AppState};
use holidays_db::Database;

use crate::config::ServerConfig;

pub async fn handle_serve_command(config: ServerConfig) -> Result<()> {
    let db_path = config.database_path();
    let db = Arc::new(
        Database::open_at(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );
    let state = AppState::new(db.clone()).context("Failed to initialize session manager")?;
    let sessions = state.sessions.clone();

    let router = create_router(
        state,
        &ApiConfig {
            allowed_origins: config.allowed_origins.clone(),
        },
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    tracing::info!(
        addr = %addr,
        database = %db_path.display(),
        origins = ?config.allowed_origins,
        "API server listening"
    );
    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("Serving http://{}", addr).bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Sessions live in memory only; end them before the store goes away
    sessions.reset();
    drop(sessions);

    match Arc::try_unwrap(db) {
        Ok(db) => db.close().context("Failed to close database")?,
        Err(_) => tracing::warn!("Database still referenced at shutdown; not closed explicitly"),
    }

    result.context("API server error")
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    eprintln!("\nShutting down...");
}
