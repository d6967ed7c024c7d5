use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

/// Errors raised while bootstrapping or shutting down the logs pipeline.
///
/// Everything before [`crate::telemetry::ShutdownHandle`] exists is fatal to
/// bootstrap and leaves global state untouched. Delivery failures after that
/// point stay inside the processors and never show up here.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A required configuration field is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The resource descriptor could not be assembled.
    #[error("Resource error: {0}")]
    Resource(String),

    /// The OTLP exporter could not be built or could not reach the collector.
    #[error("Exporter error: {0}")]
    Exporter(String),

    /// The console mirror exporter could not be built.
    #[error("Stdout exporter error: {0}")]
    StdoutExporter(String),

    /// Bootstrap was cancelled before the provider was installed.
    #[error("Initialization cancelled")]
    Cancelled,

    /// Flushing or closing the provider failed.
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl From<OTelSdkError> for TelemetryError {
    fn from(err: OTelSdkError) -> Self {
        Self::Shutdown(err.to_string())
    }
}
