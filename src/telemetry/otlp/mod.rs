//! OTLP/gRPC backend.
//!
//! Ships records to an OpenTelemetry collector over a tonic channel that is
//! dialed eagerly, so a bad endpoint fails bootstrap instead of the first
//! export.
//!
//! # Behavior
//!
//! - Plaintext when `insecure` is set, TLS (native roots unless a
//!   `ClientTlsConfig` is supplied) otherwise
//! - Reconnect schedule while dialing: 500ms base, x1.6, capped at 5s
//! - The console mirror is a [`ConsoleExporter`] on the configured target
//!
//! # Example
//!
//! ```rust,ignore
//! use otel_log_bootstrap::telemetry::{init_with_backend, LogsConfig, OtlpBackend};
//!
//! let config = LogsConfig::new("checkout").with_insecure(true);
//! let handle = init_with_backend(&OtlpBackend, &cancel, config).await?;
//! ```

pub mod dial;
pub mod exporter;

use crate::telemetry::api::LogsBackend;
use crate::telemetry::config::ResolvedConfig;
use crate::telemetry::console::ConsoleExporter;
use crate::telemetry::error::TelemetryError;

pub use dial::Backoff;
pub use exporter::build_otlp_exporter;

/// Default backend: OTLP/gRPC network sink plus console mirror
#[derive(Debug, Default, Clone, Copy)]
pub struct OtlpBackend;

impl LogsBackend for OtlpBackend {
    type Exporter = opentelemetry_otlp::LogExporter;
    type Mirror = ConsoleExporter;

    async fn build_exporter(
        &self,
        config: &ResolvedConfig,
    ) -> Result<Self::Exporter, TelemetryError> {
        build_otlp_exporter(config).await
    }

    fn build_mirror(&self, config: &ResolvedConfig) -> Result<Self::Mirror, TelemetryError> {
        ConsoleExporter::open(&config.mirror_target, config.mirror_format)
    }
}
