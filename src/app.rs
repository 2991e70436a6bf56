use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::ConfigService;
use crate::interfaces::http::{add_log, start_server};

pub async fn run() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = ConfigService::load().map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        err
    })?;

    let logs = Arc::new(Mutex::new(Vec::new()));
    let state = build_state(&config, logs.clone()).await?;

    let server = start_server(
        state,
        &config.server.host,
        config.server.port,
        config.server.max_body_bytes,
    )?;

    add_log(
        &logs,
        "INFO",
        "HttpApi",
        &format!(
            "HTTP server listening on {}:{}",
            config.server.host, config.server.port
        ),
    );
    info!(host = %config.server.host, port = config.server.port, "HTTP server started");

    server
        .await
        .map_err(|e| AppError::Internal(format!("HTTP server stopped: {}", e)))
}
