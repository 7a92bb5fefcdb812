//! Rental Engine - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin rental-api
//!
//! # Run with environment variables
//! RENTAL_SERVER__PORT=8080 RENTAL_DATABASE__URL=postgres://... cargo run --bin rental-api
//! ```
//!
//! # Environment Variables
//!
//! * `RENTAL_SERVER__HOST` - Server host (default: 0.0.0.0)
//! * `RENTAL_SERVER__PORT` - Server port (default: 8080)
//! * `RENTAL_DATABASE__URL` - PostgreSQL connection string
//! * `RENTAL_COUNTRY` - Country whose VAT and exchange rate apply to invoices
//! * `RENTAL_TIMEZONE` - Business timezone for reports (default: UTC)
//! * `RENTAL_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//!
//! `RUST_LOG` takes precedence over `RENTAL_LOG_LEVEL` when set.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::SystemClock;
use interface_api::{create_router, config::AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        addr = %config.server_addr(),
        country = config.country.as_deref().unwrap_or("-"),
        timezone = %config.timezone,
        "Starting rental API server"
    );

    let pool = infra_db::create_pool(config.database.clone())
        .await
        .context("failed to connect to database")?;
    infra_db::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    let state = AppState::from_pool(pool, Arc::new(SystemClock), &config)?;
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
///
/// If a handler cannot be installed the error is logged and that signal is
/// never awaited.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
