//! # Garage POS Checkout API
//!
//! HTTP server for `POST /checkout`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout API Server                              │
//! │                                                                         │
//! │  Till ───► HTTP (8080) ───► CheckoutEngine ───► PostgreSQL              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use garage_api::{router, ApiConfig, AppState};
use garage_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,garage=debug".into()),
        )
        .with_target(true)
        .init();

    info!("Starting Garage POS checkout API...");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        db_url = %config.database_url.chars().take(30).collect::<String>(),
        missing_batch_policy = ?config.missing_batch_policy,
        "Configuration loaded"
    );

    // Lazy pool; an unreachable database shows up on /health.
    let db = Database::connect_lazy(&config.db_config())?;
    if config.run_migrations {
        match db.run_migrations().await {
            Ok(()) => {}
            Err(e) if e.is_connectivity() => {
                warn!(error = %e, "Database unreachable at startup; migrations skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
