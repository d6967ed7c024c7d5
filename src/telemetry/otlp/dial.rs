use std::time::Duration;

use tokio::time::Instant;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

use crate::telemetry::config::ResolvedConfig;
use crate::telemetry::error::TelemetryError;

/// Handshake allowance for an attempt started with no budget left
pub const FINAL_ATTEMPT_GRACE: Duration = Duration::from_millis(250);

/// Exponential reconnect schedule used while dialing the collector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            multiplier: 1.6,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl Backoff {
    /// Delay before retry number `retries` (0-based), capped at `max_delay`
    pub fn delay(&self, retries: u32) -> Duration {
        let factor = self.multiplier.powi(retries.min(i32::MAX as u32) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        if delay >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(delay)
        }
    }
}

/// Build the tonic endpoint: plaintext when `insecure`, TLS otherwise
pub fn endpoint(config: &ResolvedConfig) -> Result<Endpoint, TelemetryError> {
    let uri = config.endpoint_uri();
    let endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|e| TelemetryError::Exporter(format!("invalid endpoint {uri}: {e}")))?
        .connect_timeout(config.dial_timeout);

    if config.insecure {
        return Ok(endpoint);
    }

    let tls = config
        .tls
        .clone()
        .unwrap_or_else(|| ClientTlsConfig::new().with_native_roots());

    endpoint
        .tls_config(tls)
        .map_err(|e| TelemetryError::Exporter(format!("TLS setup for {uri} failed: {e}")))
}

/// Connect to the collector, retrying on the backoff schedule.
///
/// The whole dial is bounded by `dial_timeout`: sleeps are clamped to the
/// remaining budget, so the last attempt starts at the deadline. That attempt
/// gets `FINAL_ATTEMPT_GRACE` to complete its handshake.
pub async fn dial(
    endpoint: &Endpoint,
    dial_timeout: Duration,
    backoff: &Backoff,
) -> Result<Channel, TelemetryError> {
    let deadline = Instant::now() + dial_timeout;
    let mut attempts = 0u32;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let bound = remaining.max(FINAL_ATTEMPT_GRACE);
        let last_error = match tokio::time::timeout(bound, endpoint.connect()).await {
            Ok(Ok(channel)) => {
                info!(
                    endpoint = %endpoint.uri(),
                    attempts = attempts + 1,
                    "Connected to OTLP collector"
                );
                return Ok(channel);
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "connect attempt timed out".to_string(),
        };
        attempts += 1;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TelemetryError::Exporter(format!(
                "could not reach {} within {:?} ({} attempts): {}",
                endpoint.uri(),
                dial_timeout,
                attempts,
                last_error
            )));
        }

        let delay = backoff.delay(attempts - 1).min(remaining);
        debug!(
            endpoint = %endpoint.uri(),
            attempt = attempts,
            retry_in = ?delay,
            error = %last_error,
            "OTLP collector not reachable yet"
        );
        tokio::time::sleep(delay).await;
    }
}
