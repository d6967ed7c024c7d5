use std::error::Error;

use opentelemetry::Context;
use otel_log_bootstrap::telemetry::{self, LogsConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Diagnostics for the bootstrap itself (dialing, shutdown) go to stderr
fn init_diagnostics() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_diagnostics();

    let mut config = LogsConfig::from_env();
    if config.service_name.trim().is_empty() {
        config.service_name = env!("CARGO_PKG_NAME").to_string();
    }
    if config.service_version.is_empty() {
        config.service_version = env!("CARGO_PKG_VERSION").to_string();
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let handle = match telemetry::init(&cancel, config).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to initialize logs");
            return Err(e.into());
        }
    };

    let cx = Context::current();
    let http = telemetry::logger("http");
    let db = telemetry::logger("db");

    telemetry::info(&cx, &http, "Server starting", [("port", 8080_i64)]);
    telemetry::debug(&cx, &db, "Connection pool warmed", [("size", 16_i64)]);
    telemetry::warn(
        &cx,
        &http,
        "Slow request",
        [("route", "/checkout"), ("elapsed_ms", "1250")],
    );
    telemetry::error(&cx, &db, "Query failed", [("table", "orders")]);
    info!("Demo records emitted");

    handle.shutdown().await?;
    Ok(())
}
