use std::borrow::Cow;
use std::sync::Arc;

use opentelemetry::logs::LoggerProvider as _;
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::logs::{
    BatchConfigBuilder, BatchLogProcessor, LogExporter, SdkLoggerProvider, SimpleLogProcessor,
};
use opentelemetry_sdk::Resource;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::telemetry::config::{LogsConfig, ResolvedConfig};
use crate::telemetry::delivery::{DeliveryState, TrackedExporter};
use crate::telemetry::emit::LoggerHandle;
use crate::telemetry::error::TelemetryError;
use crate::telemetry::global;
use crate::telemetry::otlp::OtlpBackend;
use crate::telemetry::resource::build_resource;

/// Sink construction capabilities for a logs backend (OTLP, in-memory...).
///
/// Bootstrap owns processor and provider assembly; a backend only decides
/// what the resource looks like and where records go.
pub trait LogsBackend: Send + Sync {
    /// Network sink, wrapped in the batching processor
    type Exporter: LogExporter + 'static;
    /// Console sink, wrapped in the immediate processor when mirroring is on
    type Mirror: LogExporter + 'static;

    /// Build the resource shared by every processor
    fn build_resource(&self, config: &ResolvedConfig) -> Result<Resource, TelemetryError> {
        build_resource(config)
    }

    /// Build (and connect) the network sink
    fn build_exporter(
        &self,
        config: &ResolvedConfig,
    ) -> impl std::future::Future<Output = Result<Self::Exporter, TelemetryError>> + Send;

    /// Build the console sink. Failure aborts bootstrap.
    fn build_mirror(&self, config: &ResolvedConfig) -> Result<Self::Mirror, TelemetryError>;
}

/// Batching processor: flushes every `export_interval` or when a batch fills.
/// A full queue drops the incoming record.
pub fn batch_processor<E>(exporter: E, config: &ResolvedConfig) -> BatchLogProcessor
where
    E: LogExporter + 'static,
{
    let batch_config = BatchConfigBuilder::default()
        .with_scheduled_delay(config.export_interval)
        .with_max_queue_size(config.max_queue_size)
        .build();

    BatchLogProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build()
}

/// Assemble the provider. Records fan out to the network processor first and
/// the mirror second.
pub fn assemble_provider<M>(
    resource: Resource,
    network: BatchLogProcessor,
    mirror: Option<SimpleLogProcessor<M>>,
) -> SdkLoggerProvider
where
    M: LogExporter + 'static,
{
    let mut builder = SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_log_processor(network);

    if let Some(mirror) = mirror {
        builder = builder.with_log_processor(mirror);
    }

    builder.build()
}

/// A logs pipeline owned by the caller rather than installed globally
#[derive(Debug)]
pub struct Telemetry {
    provider: Arc<SdkLoggerProvider>,
    delivery: Arc<DeliveryState>,
    config: ResolvedConfig,
}

impl Telemetry {
    /// Named component logger ("http", "db", "worker"...)
    pub fn logger(&self, name: impl Into<Cow<'static, str>>) -> LoggerHandle {
        let name = name.into();
        LoggerHandle::active(name.clone(), self.provider.logger(name))
    }

    pub fn provider(&self) -> &SdkLoggerProvider {
        &self.provider
    }

    /// Effective configuration after defaults
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Export everything buffered so far without shutting down
    pub async fn force_flush(&self) -> Result<(), TelemetryError> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || provider.force_flush())
            .await
            .map_err(|e| TelemetryError::Shutdown(e.to_string()))??;
        Ok(())
    }

    /// Stop accepting records, flush every processor and close the sinks.
    ///
    /// Fails with `Shutdown` when the final flush to the network sink or its
    /// close fails. A provider already shut down by a later `init` returns `Ok`.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        self.delivery.reset();

        if close_provider(self.provider).await? {
            self.delivery.check()
        } else {
            Ok(())
        }
    }
}

/// Shutdown procedure returned by [`init`].
///
/// Consumed by [`ShutdownHandle::shutdown`], so it runs at most once. Call it
/// during orderly termination; records still buffered when the process exits
/// without it are lost.
#[derive(Debug)]
pub struct ShutdownHandle {
    telemetry: Telemetry,
}

impl ShutdownHandle {
    /// Uninstall the provider (if still active) and shut it down
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        global::uninstall(&self.telemetry.provider);
        self.telemetry.shutdown().await
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

/// Build the default OTLP pipeline without touching global state
pub async fn bootstrap(
    cancel: &CancellationToken,
    config: LogsConfig,
) -> Result<Telemetry, TelemetryError> {
    bootstrap_with_backend(&OtlpBackend, cancel, config).await
}

/// Build a pipeline with a specific backend without touching global state
pub async fn bootstrap_with_backend<B: LogsBackend>(
    backend: &B,
    cancel: &CancellationToken,
    config: LogsConfig,
) -> Result<Telemetry, TelemetryError> {
    let config = config.resolve()?;

    if cancel.is_cancelled() {
        return Err(TelemetryError::Cancelled);
    }
    let resource = backend.build_resource(&config)?;

    let exporter = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TelemetryError::Cancelled),
        exporter = backend.build_exporter(&config) => exporter?,
    };

    let mirror = if config.enable_stdout {
        Some(SimpleLogProcessor::new(backend.build_mirror(&config)?))
    } else {
        None
    };

    if cancel.is_cancelled() {
        return Err(TelemetryError::Cancelled);
    }
    let delivery = Arc::new(DeliveryState::default());
    let tracked = TrackedExporter::new(exporter, Arc::clone(&delivery));
    let network = batch_processor(tracked, &config);

    info!(
        service = %config.service_name,
        endpoint = %config.endpoint,
        stdout = config.enable_stdout,
        export_interval = ?config.export_interval,
        max_queue_size = config.max_queue_size,
        "Logs pipeline ready"
    );

    Ok(Telemetry {
        provider: Arc::new(assemble_provider(resource, network, mirror)),
        delivery,
        config,
    })
}

/// Initialize the global logs provider with the OTLP backend. Call once at startup.
pub async fn init(
    cancel: &CancellationToken,
    config: LogsConfig,
) -> Result<ShutdownHandle, TelemetryError> {
    init_with_backend(&OtlpBackend, cancel, config).await
}

/// Initialize the global logs provider with a specific backend.
///
/// Nothing is installed unless every step succeeds. A provider installed by an
/// earlier call is replaced and shut down, flushing what it buffered.
pub async fn init_with_backend<B: LogsBackend>(
    backend: &B,
    cancel: &CancellationToken,
    config: LogsConfig,
) -> Result<ShutdownHandle, TelemetryError> {
    let telemetry = bootstrap_with_backend(backend, cancel, config).await?;

    if let Some(previous) = global::install(Arc::clone(&telemetry.provider)) {
        warn!("Replacing an active logs provider; shutting the previous one down");
        if let Err(e) = close_provider(previous).await {
            warn!(error = %e, "Previous logs provider did not shut down cleanly");
        }
    }

    Ok(ShutdownHandle { telemetry })
}

/// Run the blocking SDK shutdown off the async workers. Returns `false` when
/// the provider had already been shut down (replaced by a later `init`).
pub(crate) async fn close_provider(
    provider: Arc<SdkLoggerProvider>,
) -> Result<bool, TelemetryError> {
    let result = tokio::task::spawn_blocking(move || provider.shutdown())
        .await
        .map_err(|e| TelemetryError::Shutdown(e.to_string()))?;

    match result {
        Ok(()) => Ok(true),
        Err(OTelSdkError::AlreadyShutdown) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
