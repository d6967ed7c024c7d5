use opentelemetry_otlp::{LogExporter, WithTonicConfig};
use tonic::transport::Channel;
use tracing::info;

use crate::telemetry::config::ResolvedConfig;
use crate::telemetry::error::TelemetryError;
use crate::telemetry::otlp::dial::{dial, endpoint, Backoff};

/// Dial the collector and build the OTLP/gRPC log exporter on that channel
pub async fn build_otlp_exporter(config: &ResolvedConfig) -> Result<LogExporter, TelemetryError> {
    let endpoint = endpoint(config)?;

    info!(
        endpoint = %endpoint.uri(),
        insecure = config.insecure,
        dial_timeout = ?config.dial_timeout,
        "Dialing OTLP collector"
    );
    let channel = dial(&endpoint, config.dial_timeout, &Backoff::default()).await?;

    exporter_on_channel(channel, config)
}

/// Wrap an established channel. Caller-supplied metadata rides on every export.
pub fn exporter_on_channel(
    channel: Channel,
    config: &ResolvedConfig,
) -> Result<LogExporter, TelemetryError> {
    LogExporter::builder()
        .with_tonic()
        .with_channel(channel)
        .with_metadata(config.metadata.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))
}
