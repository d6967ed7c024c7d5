use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use opentelemetry::logs::{AnyValue, Severity};
use opentelemetry::InstrumentationScope;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::logs::{LogBatch, LogExporter, SdkLogRecord};
use opentelemetry_sdk::Resource;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::telemetry::config::{ConsoleTarget, LogFormat};
use crate::telemetry::error::TelemetryError;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Console sink for the stdout mirror.
///
/// Writes one JSON document per record with `severity` at the root, so log
/// viewers that colorize on that field pick it up without extra parsing.
pub struct ConsoleExporter {
    writer: SharedWriter,
    format: LogFormat,
    resource: Map<String, Value>,
}

impl ConsoleExporter {
    /// Open the configured target
    pub fn open(target: &ConsoleTarget, format: LogFormat) -> Result<Self, TelemetryError> {
        let writer: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stdout => Box::new(io::stdout()),
            ConsoleTarget::Stderr => Box::new(io::stderr()),
            ConsoleTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        TelemetryError::StdoutExporter(format!(
                            "cannot open {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                Box::new(file)
            }
        };

        Ok(Self::with_writer(writer, format))
    }

    /// Write to an arbitrary sink
    pub fn with_writer(writer: impl Write + Send + 'static, format: LogFormat) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            format,
            resource: Map::new(),
        }
    }

    fn write_record(
        &self,
        record: &SdkLogRecord,
        scope: &InstrumentationScope,
    ) -> io::Result<()> {
        let line = ConsoleLine::new(record, scope, &self.resource);

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("console writer poisoned"))?;

        match self.format {
            LogFormat::Pretty => serde_json::to_writer_pretty(&mut *writer, &line)?,
            LogFormat::Json => serde_json::to_writer(&mut *writer, &line)?,
        }
        writeln!(writer)?;
        writer.flush()
    }
}

impl fmt::Debug for ConsoleExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleExporter")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl LogExporter for ConsoleExporter {
    async fn export(&self, batch: LogBatch<'_>) -> OTelSdkResult {
        for (record, scope) in batch.iter() {
            self.write_record(record, scope)
                .map_err(|e| OTelSdkError::InternalFailure(e.to_string()))?;
        }
        Ok(())
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.resource = resource
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
    }
}

#[derive(Serialize)]
struct ConsoleLine<'a> {
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    scope: &'a str,
    body: Value,
    #[serde(skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span_id: Option<String>,
    #[serde(skip_serializing_if = "no_resource")]
    resource: &'a Map<String, Value>,
}

impl<'a> ConsoleLine<'a> {
    fn new(
        record: &'a SdkLogRecord,
        scope: &'a InstrumentationScope,
        resource: &'a Map<String, Value>,
    ) -> Self {
        let severity = record
            .severity_text()
            .or_else(|| record.severity_number().map(severity_name))
            .unwrap_or("DEFAULT");

        let timestamp = record
            .timestamp()
            .or_else(|| record.observed_timestamp())
            .map(|ts| {
                chrono::DateTime::<chrono::Utc>::from(ts)
                    .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
            });

        let attributes = record
            .attributes_iter()
            .map(|(key, value)| (key.to_string(), to_json(value)))
            .collect();

        let (trace_id, span_id) = match record.trace_context() {
            Some(cx) => (Some(cx.trace_id.to_string()), Some(cx.span_id.to_string())),
            None => (None, None),
        };

        Self {
            severity,
            timestamp,
            scope: scope.name(),
            body: record.body().map(to_json).unwrap_or(Value::Null),
            attributes,
            trace_id,
            span_id,
            resource,
        }
    }
}

fn no_resource(resource: &&Map<String, Value>) -> bool {
    resource.is_empty()
}

fn severity_name(severity: Severity) -> &'static str {
    match severity as i32 {
        1..=4 => "TRACE",
        5..=8 => "DEBUG",
        9..=12 => "INFO",
        13..=16 => "WARN",
        17..=20 => "ERROR",
        _ => "FATAL",
    }
}

fn to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Int(i) => Value::Number((*i).into()),
        AnyValue::Double(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.as_str().to_string()),
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::ListAny(list) => Value::Array(list.iter().map(to_json).collect()),
        AnyValue::Map(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.to_string(), to_json(value)))
                .collect(),
        ),
        other => Value::String(format!("{other:?}")),
    }
}
