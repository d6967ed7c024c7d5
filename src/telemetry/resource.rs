use std::env;

use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::{ResourceDetector, TelemetryResourceDetector};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    HOST_ARCH, HOST_NAME, SERVICE_NAME, SERVICE_VERSION,
};

use crate::telemetry::config::ResolvedConfig;
use crate::telemetry::error::TelemetryError;

/// Variable holding extra resource attributes as `k1=v1,k2=v2`
pub const RESOURCE_ATTRIBUTES_ENV: &str = "OTEL_RESOURCE_ATTRIBUTES";

pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
pub const DEPLOYMENT_LOG_LEVEL: &str = "deployment.log_level";

/// Host identity: `host.name` and `host.arch`
#[derive(Debug, Default)]
pub struct HostResourceDetector;

impl ResourceDetector for HostResourceDetector {
    fn detect(&self) -> Resource {
        let mut attrs = vec![KeyValue::new(HOST_ARCH, env::consts::ARCH)];

        if let Some(name) = hostname::get().ok().and_then(|h| h.into_string().ok()) {
            attrs.push(KeyValue::new(HOST_NAME, name));
        }

        Resource::builder_empty().with_attributes(attrs).build()
    }
}

/// Attributes set explicitly by the config. Empty optional values are skipped.
pub fn explicit_attributes(config: &ResolvedConfig) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(SERVICE_NAME, config.service_name.clone())];

    let optional = [
        (SERVICE_VERSION, &config.service_version),
        (DEPLOYMENT_ENVIRONMENT, &config.environment),
        (DEPLOYMENT_LOG_LEVEL, &config.log_level),
    ];
    for (key, value) in optional {
        if !value.is_empty() {
            attrs.push(KeyValue::new(key, value.clone()));
        }
    }

    attrs
}

/// Parse an `OTEL_RESOURCE_ATTRIBUTES` value.
///
/// Entries are comma separated `key=value` pairs with percent-encoded values.
/// Unlike the SDK's own env detector, a malformed entry is an error rather
/// than silently skipped.
pub fn parse_resource_attributes(raw: &str) -> Result<Vec<KeyValue>, TelemetryError> {
    let mut attrs = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            TelemetryError::Resource(format!(
                "{RESOURCE_ATTRIBUTES_ENV}: missing '=' in entry {entry:?}"
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(TelemetryError::Resource(format!(
                "{RESOURCE_ATTRIBUTES_ENV}: empty key in entry {entry:?}"
            )));
        }

        let value = urlencoding::decode(value.trim()).map_err(|e| {
            TelemetryError::Resource(format!(
                "{RESOURCE_ATTRIBUTES_ENV}: invalid value for {key:?}: {e}"
            ))
        })?;

        attrs.push(KeyValue::new(key.to_string(), value.into_owned()));
    }

    Ok(attrs)
}

/// Build the shared resource from the process environment
pub fn build_resource(config: &ResolvedConfig) -> Result<Resource, TelemetryError> {
    let raw = env::var(RESOURCE_ATTRIBUTES_ENV).unwrap_or_default();
    build_resource_from(config, &raw)
}

/// Merge, later entries winning: env attributes, host identity, SDK identity,
/// then the explicit service attributes.
pub fn build_resource_from(
    config: &ResolvedConfig,
    resource_attributes: &str,
) -> Result<Resource, TelemetryError> {
    let from_env = parse_resource_attributes(resource_attributes)?;

    let detectors: [Box<dyn ResourceDetector>; 2] = [
        Box::new(HostResourceDetector),
        Box::new(TelemetryResourceDetector),
    ];

    Ok(Resource::builder_empty()
        .with_attributes(from_env)
        .with_detectors(&detectors)
        .with_attributes(explicit_attributes(config))
        .build())
}
