use std::sync::Arc;

use tokio::signal;

pub mod config;
pub mod dto;
pub mod error;
mod logger;
mod mysql_executor;
pub mod routes;
pub mod state;

use config::AppConfig;
use mysql_executor::MySqlExecutor;
use state::AppState;

/// Boots the service: reads configuration from the environment, opens the
/// MySQL connection pool, and serves the HTTP API until shutdown is
/// requested.
pub async fn run() -> Result<(), String> {
    let _ = logger::init();

    let config = AppConfig::from_env()?;
    let executor = MySqlExecutor::new(&config.database_url()).map_err(|e| e.to_string())?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        executor: Arc::new(executor),
        config: Arc::new(config),
    };

    let router = routes::build_router(state);

    log::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}
