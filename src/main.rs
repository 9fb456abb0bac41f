//! Azni greeting service.
//!
//! ```text
//!     Client ──GET /──▶ request id ──▶ segment ──▶ timeout ──▶ index
//!                                         │                     │
//!                                         │          prepare-response subsegment
//!                                         │            response_size annotation
//!                                         ▼
//!                              fmt logs / OTLP exporter
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use azni::config::load_config;
use azni::observability::logging;
use azni::{HttpServer, Shutdown, TraceRecorder};

#[derive(Parser)]
#[command(name = "azni")]
#[command(about = "Traced JSON greeting service", long_about = None)]
struct Cli {
    /// Optional TOML config file (listener, timeouts, observability).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.bind)?;
    let telemetry = logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        service_name = %config.observability.service_name,
        request_timeout_secs = config.timeouts.request_secs,
        app_config_set = config.app.app_config.is_some(),
        db_password_set = config.app.db_password.is_some(),
        "Configuration loaded"
    );

    let recorder = Arc::new(TraceRecorder::new(
        config.observability.service_name.clone(),
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, recorder);
    server.run(listener, shutdown.subscribe()).await?;

    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
