use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

pub async fn run() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let state = bootstrap::setup(&config).await?;
    let server = start_server(state, &config).map_err(|err| {
        error!(error = %err, host = %config.host, port = config.port, "Failed to bind HTTP server");
        AppError::from(err)
    })?;

    info!(
        url = %format!("http://{}:{}", config.host, config.port),
        "fleetscan ready"
    );
    server.await?;
    info!("HTTP server stopped");
    Ok(())
}
