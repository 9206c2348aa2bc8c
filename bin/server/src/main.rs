use coffeebot_integration::HttpConnector;
use coffeebot_server::{AppState, config::ServerConfig, error::ServerError, router};
use rootcause::prelude::ResultExt;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!(error = %report, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> coffeebot_core::Result<(), ServerError> {
    let config = ServerConfig::from_env().map_err(|e| ServerError::Config {
        details: e.to_string(),
    })?;
    tracing::info!(listen_addr = %config.listen_addr, "Loaded configuration");

    let connector = HttpConnector::new(&config.connector).context(ServerError::Connector)?;
    let app = router(Arc::new(AppState::with_connector(connector)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: config.listen_addr.clone(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve {
            details: e.to_string(),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
