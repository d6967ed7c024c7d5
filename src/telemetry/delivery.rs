//! Delivery outcome of the network sink.
//!
//! The batch processor swallows the result of its final export and of closing
//! the exporter. [`TrackedExporter`] records both in a [`DeliveryState`] so
//! shutdown can report them.
//!
//! Policy: failed periodic exports are logged and dropped. Only a failure of
//! the flush or close performed by shutdown reaches the caller.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::logs::{LogBatch, LogExporter};
use opentelemetry_sdk::Resource;
use tracing::warn;

use crate::telemetry::error::TelemetryError;

#[derive(Debug, Default)]
struct Outcome {
    export: Option<String>,
    close: Option<String>,
}

/// Failures seen by a [`TrackedExporter`] since the last [`DeliveryState::reset`]
#[derive(Debug, Default)]
pub struct DeliveryState {
    outcome: Mutex<Outcome>,
}

impl DeliveryState {
    fn update(&self, f: impl FnOnce(&mut Outcome)) {
        let mut outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut outcome);
    }

    /// Forget earlier failures; called right before shutdown starts flushing
    pub fn reset(&self) {
        self.update(|outcome| *outcome = Outcome::default());
    }

    /// `Shutdown` error if an export or the close failed since the last reset
    pub fn check(&self) -> Result<(), TelemetryError> {
        let outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);

        match (&outcome.export, &outcome.close) {
            (None, None) => Ok(()),
            (Some(export), None) => Err(TelemetryError::Shutdown(format!(
                "final export failed: {export}"
            ))),
            (None, Some(close)) => Err(TelemetryError::Shutdown(format!(
                "closing exporter failed: {close}"
            ))),
            (Some(export), Some(close)) => Err(TelemetryError::Shutdown(format!(
                "final export failed: {export}; closing exporter failed: {close}"
            ))),
        }
    }
}

/// Network exporter wrapper that records export and close failures
#[derive(Debug)]
pub struct TrackedExporter<E> {
    inner: E,
    state: Arc<DeliveryState>,
}

impl<E: LogExporter> TrackedExporter<E> {
    pub fn new(inner: E, state: Arc<DeliveryState>) -> Self {
        Self { inner, state }
    }
}

impl<E: LogExporter> LogExporter for TrackedExporter<E> {
    async fn export(&self, batch: LogBatch<'_>) -> OTelSdkResult {
        let result = self.inner.export(batch).await;

        if let Err(e) = &result {
            warn!(error = %e, "Log export failed; batch dropped");
            self.state.update(|outcome| outcome.export = Some(e.to_string()));
        }
        result
    }

    fn shutdown_with_timeout(&self, timeout: Duration) -> OTelSdkResult {
        let result = self.inner.shutdown_with_timeout(timeout);

        if let Err(e) = &result {
            self.state.update(|outcome| outcome.close = Some(e.to_string()));
        }
        result
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }
}
