//! Test doubles: in-memory backend, failing sink, capturing console writer,
//! mock OTLP collector.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opentelemetry::logs::AnyValue;
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_server::{
    LogsService, LogsServiceServer,
};
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use opentelemetry_proto::tonic::common::v1::any_value::Value as ProtoValue;
use opentelemetry_proto::tonic::logs::v1::LogRecord as ProtoLogRecord;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::logs::{LogBatch, LogExporter, SdkLogRecord};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, MutexGuard};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

use crate::telemetry::api::{bootstrap_with_backend, LogsBackend, Telemetry};
use crate::telemetry::config::{LogFormat, LogsConfig, ResolvedConfig};
use crate::telemetry::console::ConsoleExporter;
use crate::telemetry::error::TelemetryError;

static GLOBAL_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Serializes tests that touch the global provider slot
pub(crate) async fn global_lock() -> MutexGuard<'static, ()> {
    GLOBAL_LOCK.lock().await
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Exporter that keeps every exported record, including after shutdown
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingExporter {
    records: Arc<Mutex<Vec<SdkLogRecord>>>,
}

impl RecordingExporter {
    pub(crate) fn records(&self) -> Vec<SdkLogRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl LogExporter for RecordingExporter {
    async fn export(&self, batch: LogBatch<'_>) -> OTelSdkResult {
        let mut records = self
            .records
            .lock()
            .map_err(|e| OTelSdkError::InternalFailure(e.to_string()))?;
        records.extend(batch.iter().map(|(record, _)| record.clone()));
        Ok(())
    }
}

/// Exporter whose exports and close are always rejected
#[derive(Debug, Default)]
pub(crate) struct FailingExporter;

impl LogExporter for FailingExporter {
    async fn export(&self, _batch: LogBatch<'_>) -> OTelSdkResult {
        Err(OTelSdkError::InternalFailure("collector rejected batch".into()))
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        Err(OTelSdkError::InternalFailure("connection reset".into()))
    }
}

/// Backend that keeps exported records in memory and mirrors to a buffer
#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    exporter: RecordingExporter,
    console: SharedBuffer,
    fail_mirror: bool,
}

impl MemoryBackend {
    pub(crate) fn failing_mirror() -> Self {
        Self {
            fail_mirror: true,
            ..Self::default()
        }
    }

    pub(crate) fn records(&self) -> Vec<SdkLogRecord> {
        self.exporter.records()
    }

    pub(crate) fn console(&self) -> &SharedBuffer {
        &self.console
    }
}

impl LogsBackend for MemoryBackend {
    type Exporter = RecordingExporter;
    type Mirror = ConsoleExporter;

    async fn build_exporter(
        &self,
        _config: &ResolvedConfig,
    ) -> Result<Self::Exporter, TelemetryError> {
        Ok(self.exporter.clone())
    }

    fn build_mirror(&self, _config: &ResolvedConfig) -> Result<Self::Mirror, TelemetryError> {
        if self.fail_mirror {
            return Err(TelemetryError::StdoutExporter("mirror unavailable".into()));
        }
        Ok(ConsoleExporter::with_writer(
            self.console.clone(),
            LogFormat::Json,
        ))
    }
}

/// Backend whose network sink rejects every export and fails to close
#[derive(Debug, Default)]
pub(crate) struct FailingBackend;

impl LogsBackend for FailingBackend {
    type Exporter = FailingExporter;
    type Mirror = ConsoleExporter;

    async fn build_exporter(
        &self,
        _config: &ResolvedConfig,
    ) -> Result<Self::Exporter, TelemetryError> {
        Ok(FailingExporter)
    }

    fn build_mirror(&self, _config: &ResolvedConfig) -> Result<Self::Mirror, TelemetryError> {
        Ok(ConsoleExporter::with_writer(
            SharedBuffer::default(),
            LogFormat::Json,
        ))
    }
}

pub(crate) fn test_config() -> LogsConfig {
    LogsConfig::new("test-service")
        .with_service_version("1.0.0")
        .with_export_interval(Duration::from_millis(100))
}

/// Caller-owned pipeline on a [`MemoryBackend`]
pub(crate) async fn memory_telemetry(backend: &MemoryBackend, stdout: bool) -> Telemetry {
    bootstrap_with_backend(
        backend,
        &CancellationToken::new(),
        test_config().with_stdout(stdout),
    )
    .await
    .unwrap()
}

pub(crate) fn record_body(record: &SdkLogRecord) -> String {
    match record.body() {
        Some(AnyValue::String(s)) => s.as_str().to_string(),
        other => format!("{other:?}"),
    }
}

#[derive(Clone, Default)]
struct Collected(Arc<Mutex<Vec<ProtoLogRecord>>>);

#[tonic::async_trait]
impl LogsService for Collected {
    async fn export(
        &self,
        request: tonic::Request<ExportLogsServiceRequest>,
    ) -> Result<tonic::Response<ExportLogsServiceResponse>, tonic::Status> {
        let records = request
            .into_inner()
            .resource_logs
            .into_iter()
            .flat_map(|resource_logs| resource_logs.scope_logs)
            .flat_map(|scope_logs| scope_logs.log_records);

        self.0.lock().unwrap().extend(records);
        Ok(tonic::Response::new(ExportLogsServiceResponse::default()))
    }
}

/// OTLP/gRPC logs collector on a random local port
pub(crate) struct MockCollector {
    addr: SocketAddr,
    collected: Collected,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockCollector {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let collected = Collected::default();
        let service = LogsServiceServer::new(collected.clone());
        let (shutdown, stopped) = oneshot::channel::<()>();

        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = stopped.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            collected,
            shutdown: Some(shutdown),
        }
    }

    pub(crate) fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub(crate) fn records(&self) -> Vec<ProtoLogRecord> {
        self.collected.0.lock().unwrap().clone()
    }
}

impl Drop for MockCollector {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub(crate) fn proto_body(record: &ProtoLogRecord) -> String {
    match record.body.as_ref().and_then(|body| body.value.as_ref()) {
        Some(ProtoValue::StringValue(s)) => s.clone(),
        other => format!("{other:?}"),
    }
}
