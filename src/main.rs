use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api_token_gate::config::LogFormat;
use api_token_gate::metrics::try_init_metrics;
use api_token_gate::{ApiTokenAuth, AppState, Config, build_router, utils};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();

    // Logging follows the configuration when it loaded
    let (level, format) = match &config {
        Ok(config) => (config.log_level.clone(), config.log_format),
        Err(_) => ("info".to_string(), LogFormat::Pretty),
    };
    init_tracing(&level, format);

    info!("Starting API Token Gate v{}", env!("CARGO_PKG_VERSION"));

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => {
            error!("Configuration error: {e}");
            Err(exitcode::CONFIG)
        }
    };

    match result {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_thread_ids(true).init(),
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: Config) -> Result<(), exitcode::ExitCode> {
    info!(
        host = %config.host,
        port = %config.port,
        permissive = config.gate.permissive_mode,
        "Configuration loaded"
    );

    let gate = ApiTokenAuth::new(&config.gate).map_err(|e| {
        error!("Invalid gate configuration: {e}");
        exitcode::CONFIG
    })?;

    if let Some(metrics_addr) = config.metrics_addr() {
        try_init_metrics(metrics_addr);
    }

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;

    let state = AppState::new(config);
    let app = build_router(state, gate);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("  GET  /health - Health check (not gated)");
    info!("  *    /*      - Gated echo downstream");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Server shutdown complete");
    Ok(())
}
