//! Quality API - polymer latex quality classification service
//!
//! Loads the trained models once at startup and serves predictions,
//! dataset replay and evaluation metrics over HTTP.

use anyhow::Result;
use quality_server::{api, config::ServiceConfig};
use server_lib::observability::StructuredLogger;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting quality-server");

    let config = ServiceConfig::load()?;
    info!(
        service = %config.service_name,
        model_dir = %config.model_dir.display(),
        "Service configured"
    );

    let logger = StructuredLogger::new(&config.service_name);
    let state = quality_server::initialize(&config, &logger).await?;

    let registry = state.router.registry();
    logger.log_startup(SERVICE_VERSION, &registry.list_models(), registry.has_scaler());

    // Ready only once every model is loaded
    state.health_registry.set_ready(true).await;

    let server = tokio::spawn(api::serve(config.bind_addr(), state));

    tokio::select! {
        result = server => {
            logger.log_shutdown("API server stopped");
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
