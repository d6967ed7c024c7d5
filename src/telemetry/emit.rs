//! Severity emitters.
//!
//! Fire-and-forget: a record is stamped and handed to the processors, and the
//! call returns. Delivery failures are handled by the processors and never
//! reach the call site. Records from one handle on one thread reach the
//! processors in call order.

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, LogRecord, Logger, Severity};
use opentelemetry::{Context, Key};
use opentelemetry_sdk::logs::SdkLogger;

/// Use when a record carries no attributes
pub const NO_ATTRIBUTES: [(&str, &str); 0] = [];

/// Severity of an emitted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn severity(self) -> Severity {
        match self {
            Self::Debug => Severity::Debug,
            Self::Info => Severity::Info,
            Self::Warn => Severity::Warn,
            Self::Error => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Named logger. Cheap to create; inert when no provider backs it.
pub struct LoggerHandle {
    name: Cow<'static, str>,
    logger: Option<SdkLogger>,
}

impl LoggerHandle {
    pub(crate) fn active(name: Cow<'static, str>, logger: SdkLogger) -> Self {
        Self {
            name,
            logger: Some(logger),
        }
    }

    /// A handle that drops everything emitted through it
    pub fn inert(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            logger: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False for handles obtained before any provider was installed
    pub fn is_active(&self) -> bool {
        self.logger.is_some()
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Stamp and emit one record.
///
/// `cx` is attached while the record is handed over, so an active span in it
/// ends up as the record's trace context. Cancellation carried by the caller
/// does not suppress an emit already in progress.
pub fn emit<I, K, V>(
    cx: &Context,
    logger: &LoggerHandle,
    level: Level,
    message: impl Into<String>,
    attributes: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<AnyValue>,
{
    let Some(inner) = &logger.logger else {
        return;
    };

    let mut record = inner.create_log_record();
    record.set_timestamp(SystemTime::now());
    record.set_severity_number(level.severity());
    record.set_severity_text(level.as_str());
    record.set_body(AnyValue::from(message.into()));
    record.add_attributes(attributes);

    let _guard = cx.clone().attach();
    inner.emit(record);
}

pub fn debug<I, K, V>(
    cx: &Context,
    logger: &LoggerHandle,
    message: impl Into<String>,
    attributes: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<AnyValue>,
{
    emit(cx, logger, Level::Debug, message, attributes)
}

pub fn info<I, K, V>(
    cx: &Context,
    logger: &LoggerHandle,
    message: impl Into<String>,
    attributes: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<AnyValue>,
{
    emit(cx, logger, Level::Info, message, attributes)
}

pub fn warn<I, K, V>(
    cx: &Context,
    logger: &LoggerHandle,
    message: impl Into<String>,
    attributes: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<AnyValue>,
{
    emit(cx, logger, Level::Warn, message, attributes)
}

pub fn error<I, K, V>(
    cx: &Context,
    logger: &LoggerHandle,
    message: impl Into<String>,
    attributes: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<AnyValue>,
{
    emit(cx, logger, Level::Error, message, attributes)
}
