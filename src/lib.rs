pub mod telemetry;

pub use telemetry::{init, logger, LogsConfig, ShutdownHandle, TelemetryError};
