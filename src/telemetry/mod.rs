//! OpenTelemetry logs bootstrap.
//!
//! Builds a logs pipeline (resource, OTLP/gRPC exporter behind a batching
//! processor, optional console mirror), installs it process-wide and hands
//! back the procedure that flushes and closes it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use opentelemetry::Context;
//! use otel_log_bootstrap::telemetry::{self, LogsConfig, NO_ATTRIBUTES};
//!
//! let handle = telemetry::init(&cancel, LogsConfig::new("checkout")).await?;
//!
//! let log = telemetry::logger("http");
//! telemetry::info(&Context::current(), &log, "request served", [("route", "/cart")]);
//!
//! handle.shutdown().await?;
//! ```
//!
//! # Configuration
//!
//! ## Using the Builder
//!
//! ```rust,ignore
//! use otel_log_bootstrap::telemetry::LogsConfig;
//!
//! let config = LogsConfig::builder()
//!     .service_name("checkout")
//!     .service_version("1.4.2")
//!     .environment("staging")
//!     .endpoint("collector:4317")
//!     .insecure()
//!     .stdout()
//!     .json()
//!     .build();
//! ```
//!
//! ## Caller-owned pipelines
//!
//! [`bootstrap`] builds the same pipeline without installing it. Components
//! handed a [`Telemetry`] never touch global state, which keeps tests
//! independent of each other.
//!
//! ## Backends
//!
//! - [`OtlpBackend`]: OTLP/gRPC collector plus [`ConsoleExporter`] mirror
//! - anything implementing [`LogsBackend`]
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | Collector address, when not set explicitly | `localhost:4317` |
//! | `OTEL_EXPORTER_OTLP_INSECURE` | Plaintext gRPC | `false` |
//! | `OTEL_RESOURCE_ATTRIBUTES` | Extra `key=value,...` resource attributes | - |
//! | `OTEL_SERVICE_NAME` | Service name ([`LogsConfig::from_env`]) | - |
//! | `OTEL_SERVICE_VERSION` | Service version ([`LogsConfig::from_env`]) | - |
//! | `DEPLOYMENT_ENVIRONMENT` | Deployment environment ([`LogsConfig::from_env`]) | - |
//! | `LOG_LEVEL` / `RUST_LOG` | Recorded as `deployment.log_level` | - |
//! | `LOG_STDOUT` | Mirror records to stdout | `false` |
//! | `LOG_FORMAT` | Mirror format, `pretty` or `json` | `pretty` |
//!
//! # Module Structure
//!
//! - [`api`]: Backend trait, bootstrap and shutdown
//! - [`config`]: Configuration types and defaults
//! - [`resource`]: Resource attributes
//! - [`otlp`]: Collector dialing and the OTLP exporter
//! - [`console`]: Console mirror sink
//! - [`delivery`]: Network sink failure tracking for shutdown
//! - [`global`]: Process-wide provider and named loggers
//! - [`emit`]: Severity emitters
//! - [`error`]: Error types

pub mod api;
pub mod config;
pub mod console;
pub mod delivery;
pub mod emit;
pub mod error;
pub mod global;
pub mod otlp;
pub mod resource;

#[cfg(test)]
mod testing;

// Re-exports
pub use api::{
    bootstrap, bootstrap_with_backend, init, init_with_backend, LogsBackend, ShutdownHandle,
    Telemetry,
};
pub use config::{ConsoleTarget, LogFormat, LogsConfig, LogsConfigBuilder, ResolvedConfig};
pub use console::ConsoleExporter;
pub use emit::{debug, emit, error, info, warn, Level, LoggerHandle, NO_ATTRIBUTES};
pub use error::TelemetryError;
pub use global::logger;
pub use otlp::OtlpBackend;
