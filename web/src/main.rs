//! Credit meter session store server.
//!
//! Serves the anonymous session API and sweeps idle sessions in the background.

use credit_meter_ledger::{CreditLedger, LedgerBackend};
use credit_meter_web::{AppState, ServerConfig, build_router, metrics};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "credit_meter_server=info,credit_meter_web=info,credit_meter_ledger=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting credit meter session store");

    let config = ServerConfig::from_env()?;
    info!(
        address = %config.bind_address(),
        credit_grant = config.credit_grant,
        idle_ttl_secs = config.idle_ttl_secs,
        redis = config.redis_url.is_some(),
        "Configuration loaded"
    );

    let ledger = LedgerBackend::connect(config.redis_url.as_deref(), config.ledger_config()).await?;
    info!(backend = ledger.name(), "Ledger ready");

    let mut state = AppState::new(ledger);
    if let Some(handle) = metrics::install_recorder() {
        state = state.with_metrics(handle);
    }

    let purge_task = spawn_purge_task(Arc::clone(&state.ledger), config.purge_interval());

    let app = build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    info!("Server stopped");
    Ok(())
}

/// Periodically drop sessions that have been idle past the TTL.
fn spawn_purge_task(
    ledger: Arc<LedgerBackend>,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            match ledger.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged expired sessions"),
                Err(e) => warn!(error = %e, "Expired session purge failed"),
            }
        }
    })
}

/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
