use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tonic::metadata::MetadataMap;
use tonic::transport::ClientTlsConfig;

use crate::telemetry::error::TelemetryError;

/// Collector address used when neither the config nor the environment name one
pub const DEFAULT_ENDPOINT: &str = "localhost:4317";

/// Standard OTLP endpoint variable, consulted when `endpoint` is unset
pub const ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 4096;

/// Console mirror output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Indented JSON, one document per record (for local dev)
    #[default]
    Pretty,
    /// Compact JSON, one line per record
    Json,
}

/// Where the console mirror writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
    /// Append to a file, created if missing
    File(PathBuf),
}

/// Logs pipeline configuration.
///
/// Only `service_name` is required. Unset or zero-valued tunables are filled in
/// by [`LogsConfig::resolve`].
#[derive(Debug, Clone)]
pub struct LogsConfig {
    /// Collector address, e.g. `otel-collector:4317`
    pub endpoint: Option<String>,
    /// Plaintext transport (in-cluster / local). TLS otherwise.
    pub insecure: bool,
    pub service_name: String,
    pub service_version: String,
    /// Deployment tag: `prod`, `staging`, `dev`...
    pub environment: String,
    /// Level tag attached to the resource as `deployment.log_level`
    pub log_level: String,
    /// Mirror every record to the console as well
    pub enable_stdout: bool,
    pub mirror_format: LogFormat,
    pub mirror_target: ConsoleTarget,
    pub dial_timeout: Option<Duration>,
    pub export_interval: Option<Duration>,
    pub max_queue_size: Option<usize>,
    /// gRPC headers sent with every export (auth tokens, tenant ids)
    pub metadata: MetadataMap,
    /// TLS settings for secure transport; native roots when unset
    pub tls: Option<ClientTlsConfig>,
}

impl LogsConfig {
    /// Create a config with the given service name and everything else unset
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            insecure: false,
            service_name: service_name.into(),
            service_version: String::new(),
            environment: String::new(),
            log_level: String::new(),
            enable_stdout: false,
            mirror_format: LogFormat::default(),
            mirror_target: ConsoleTarget::default(),
            dial_timeout: None,
            export_interval: None,
            max_queue_size: None,
            metadata: MetadataMap::new(),
            tls: None,
        }
    }

    /// Create config from environment variables
    /// - OTEL_SERVICE_NAME / OTEL_SERVICE_VERSION for service identity
    /// - DEPLOYMENT_ENVIRONMENT for the environment tag
    /// - LOG_LEVEL (falls back to RUST_LOG) for the level tag
    /// - OTEL_EXPORTER_OTLP_INSECURE, LOG_STDOUT as booleans
    /// - LOG_FORMAT as `pretty` or `json`
    ///
    /// The endpoint is left unset so that [`LogsConfig::resolve`] applies its
    /// usual fallback chain.
    pub fn from_env() -> Self {
        let mirror_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let mut config = Self::new(env::var("OTEL_SERVICE_NAME").unwrap_or_default());
        config.service_version = env::var("OTEL_SERVICE_VERSION").unwrap_or_default();
        config.environment = env::var("DEPLOYMENT_ENVIRONMENT").unwrap_or_default();
        config.log_level = env::var("LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_default();
        config.insecure = env_flag("OTEL_EXPORTER_OTLP_INSECURE");
        config.enable_stdout = env_flag("LOG_STDOUT");
        config.mirror_format = mirror_format;
        config
    }

    pub fn builder() -> LogsConfigBuilder {
        LogsConfigBuilder::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.enable_stdout = enabled;
        self
    }

    pub fn with_mirror_format(mut self, format: LogFormat) -> Self {
        self.mirror_format = format;
        self
    }

    pub fn with_mirror_target(mut self, target: ConsoleTarget) -> Self {
        self.mirror_target = target;
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = Some(timeout);
        self
    }

    pub fn with_export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = Some(interval);
        self
    }

    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = Some(size);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tls_config(mut self, tls: ClientTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Validate and fill in defaults, reading the process environment for the
    /// endpoint fallback.
    pub fn resolve(self) -> Result<ResolvedConfig, TelemetryError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Same as [`LogsConfig::resolve`] with an injectable environment lookup
    pub fn resolve_with<F>(self, lookup: F) -> Result<ResolvedConfig, TelemetryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config("service name is required".into()));
        }

        let endpoint = resolve_endpoint(self.endpoint.as_deref(), lookup);

        Ok(ResolvedConfig {
            endpoint,
            insecure: self.insecure,
            service_name: self.service_name,
            service_version: self.service_version,
            environment: self.environment,
            log_level: self.log_level,
            enable_stdout: self.enable_stdout,
            mirror_format: self.mirror_format,
            mirror_target: self.mirror_target,
            dial_timeout: non_zero_or(self.dial_timeout, DEFAULT_DIAL_TIMEOUT),
            export_interval: non_zero_or(self.export_interval, DEFAULT_EXPORT_INTERVAL),
            max_queue_size: self
                .max_queue_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_MAX_QUEUE_SIZE),
            metadata: self.metadata,
            tls: self.tls,
        })
    }
}

/// Endpoint precedence: explicit value, then `OTEL_EXPORTER_OTLP_ENDPOINT`,
/// then [`DEFAULT_ENDPOINT`]. Blank values count as unset.
pub fn resolve_endpoint<F>(explicit: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = explicit.map(str::trim).filter(|e| !e.is_empty()) {
        return endpoint.to_string();
    }

    lookup(ENDPOINT_ENV)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

fn non_zero_or(value: Option<Duration>, default: Duration) -> Duration {
    value.filter(|d| !d.is_zero()).unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).as_deref().map(str::to_ascii_lowercase).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Configuration with every default applied. Produced by [`LogsConfig::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub insecure: bool,
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub log_level: String,
    pub enable_stdout: bool,
    pub mirror_format: LogFormat,
    pub mirror_target: ConsoleTarget,
    pub dial_timeout: Duration,
    pub export_interval: Duration,
    pub max_queue_size: usize,
    pub metadata: MetadataMap,
    pub tls: Option<ClientTlsConfig>,
}

impl ResolvedConfig {
    /// Endpoint as a URI. Bare `host:port` gets `http://` for plaintext and
    /// `https://` for secure transport.
    pub fn endpoint_uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.insecure {
            format!("http://{}", self.endpoint)
        } else {
            format!("https://{}", self.endpoint)
        }
    }
}

#[derive(Default)]
pub struct LogsConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    environment: Option<String>,
    log_level: Option<String>,
    endpoint: Option<String>,
    insecure: bool,
    enable_stdout: bool,
    mirror_format: Option<LogFormat>,
    mirror_target: Option<ConsoleTarget>,
    dial_timeout: Option<Duration>,
    export_interval: Option<Duration>,
    max_queue_size: Option<usize>,
    metadata: MetadataMap,
    tls: Option<ClientTlsConfig>,
}

impl LogsConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    pub fn stdout(mut self) -> Self {
        self.enable_stdout = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.mirror_format = Some(LogFormat::Json);
        self
    }

    pub fn pretty(mut self) -> Self {
        self.mirror_format = Some(LogFormat::Pretty);
        self
    }

    /// Where the mirror writes: stdout, stderr or a file
    pub fn mirror_target(mut self, target: ConsoleTarget) -> Self {
        self.mirror_target = Some(target);
        self
    }

    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = Some(timeout);
        self
    }

    pub fn export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = Some(interval);
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = Some(size);
        self
    }

    /// gRPC metadata sent with every export (auth headers...)
    pub fn metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn tls_config(mut self, tls: ClientTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn build(self) -> LogsConfig {
        let mut config = LogsConfig::new(self.service_name.unwrap_or_default());
        config.service_version = self.service_version.unwrap_or_default();
        config.environment = self.environment.unwrap_or_default();
        config.log_level = self.log_level.unwrap_or_default();
        config.endpoint = self.endpoint;
        config.insecure = self.insecure;
        config.enable_stdout = self.enable_stdout;
        config.mirror_format = self.mirror_format.unwrap_or_default();
        config.mirror_target = self.mirror_target.unwrap_or_default();
        config.dial_timeout = self.dial_timeout;
        config.export_interval = self.export_interval;
        config.max_queue_size = self.max_queue_size;
        config.metadata = self.metadata;
        config.tls = self.tls;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn log_format_default_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn console_target_default_is_stdout() {
        assert_eq!(ConsoleTarget::default(), ConsoleTarget::Stdout);
    }

    #[test]
    fn resolve_rejects_empty_service_name() {
        let result = LogsConfig::new("").resolve_with(no_env);

        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn resolve_rejects_blank_service_name() {
        let result = LogsConfig::new("   ").resolve_with(no_env);

        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn resolve_applies_defaults() {
        let config = LogsConfig::new("svc").resolve_with(no_env).unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.dial_timeout, Duration::from_secs(10));
        assert_eq!(config.export_interval, Duration::from_secs(2));
        assert_eq!(config.max_queue_size, 4096);
        assert!(!config.insecure);
        assert!(!config.enable_stdout);
    }

    #[test]
    fn resolve_treats_zero_values_as_unset() {
        let config = LogsConfig::new("svc")
            .with_dial_timeout(Duration::ZERO)
            .with_export_interval(Duration::ZERO)
            .with_max_queue_size(0)
            .resolve_with(no_env)
            .unwrap();

        assert_eq!(config.dial_timeout, DEFAULT_DIAL_TIMEOUT);
        assert_eq!(config.export_interval, DEFAULT_EXPORT_INTERVAL);
        assert_eq!(config.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
    }

    #[test]
    fn resolve_keeps_explicit_tunables() {
        let config = LogsConfig::new("svc")
            .with_dial_timeout(Duration::from_secs(3))
            .with_export_interval(Duration::from_millis(250))
            .with_max_queue_size(64)
            .resolve_with(no_env)
            .unwrap();

        assert_eq!(config.dial_timeout, Duration::from_secs(3));
        assert_eq!(config.export_interval, Duration::from_millis(250));
        assert_eq!(config.max_queue_size, 64);
    }

    #[test]
    fn endpoint_explicit_wins_over_env() {
        let endpoint = resolve_endpoint(Some("collector:4317"), |_| {
            Some("env-collector:4317".to_string())
        });

        assert_eq!(endpoint, "collector:4317");
    }

    #[test]
    fn endpoint_env_wins_over_default() {
        let endpoint = resolve_endpoint(None, |key| {
            (key == ENDPOINT_ENV).then(|| "env-collector:4317".to_string())
        });

        assert_eq!(endpoint, "env-collector:4317");
    }

    #[test]
    fn endpoint_falls_back_to_default() {
        assert_eq!(resolve_endpoint(None, no_env), DEFAULT_ENDPOINT);
    }

    #[test]
    fn blank_endpoint_values_are_skipped() {
        assert_eq!(resolve_endpoint(Some(""), |_| Some(" ".into())), DEFAULT_ENDPOINT);
    }

    #[test]
    fn endpoint_uri_adds_scheme_for_transport() {
        let plaintext = LogsConfig::new("svc")
            .with_insecure(true)
            .resolve_with(no_env)
            .unwrap();
        let secure = LogsConfig::new("svc").resolve_with(no_env).unwrap();

        assert_eq!(plaintext.endpoint_uri(), "http://localhost:4317");
        assert_eq!(secure.endpoint_uri(), "https://localhost:4317");
    }

    #[test]
    fn endpoint_uri_keeps_explicit_scheme() {
        let config = LogsConfig::new("svc")
            .with_endpoint("http://collector:4317")
            .resolve_with(no_env)
            .unwrap();

        assert_eq!(config.endpoint_uri(), "http://collector:4317");
    }

    #[test]
    fn config_with_methods_chain() {
        let config = LogsConfig::new("svc")
            .with_service_version("1.0")
            .with_environment("staging")
            .with_log_level("debug")
            .with_stdout(true)
            .with_mirror_format(LogFormat::Json);

        assert_eq!(config.service_version, "1.0");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.log_level, "debug");
        assert!(config.enable_stdout);
        assert_eq!(config.mirror_format, LogFormat::Json);
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = LogsConfig::builder()
            .service_name("my-service")
            .service_version("2.0.0")
            .environment("prod")
            .log_level("warn")
            .endpoint("collector:4317")
            .insecure()
            .stdout()
            .json()
            .max_queue_size(128)
            .build();

        assert_eq!(config.service_name, "my-service");
        assert_eq!(config.service_version, "2.0.0");
        assert_eq!(config.environment, "prod");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.endpoint.as_deref(), Some("collector:4317"));
        assert!(config.insecure);
        assert!(config.enable_stdout);
        assert_eq!(config.mirror_format, LogFormat::Json);
        assert_eq!(config.max_queue_size, Some(128));
    }

    #[test]
    fn builder_sets_sink_and_transport_fields() {
        let mut metadata = MetadataMap::new();
        metadata.insert("x-api-key", "secret".parse().unwrap());

        let config = LogsConfig::builder()
            .service_name("my-service")
            .mirror_target(ConsoleTarget::Stderr)
            .metadata(metadata)
            .tls_config(ClientTlsConfig::new().domain_name("collector.internal"))
            .build();

        assert_eq!(config.mirror_target, ConsoleTarget::Stderr);
        assert_eq!(
            config.metadata.get("x-api-key").and_then(|v| v.to_str().ok()),
            Some("secret")
        );
        assert!(config.tls.is_some());
    }

    #[test]
    fn builder_without_service_name_fails_to_resolve() {
        let result = LogsConfig::builder().pretty().build().resolve_with(no_env);

        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn config_from_env_reads_identity_and_flags() {
        env::set_var("OTEL_SERVICE_NAME", "env-service");
        env::set_var("DEPLOYMENT_ENVIRONMENT", "dev");
        env::set_var("LOG_STDOUT", "true");
        env::set_var("LOG_FORMAT", "json");

        let config = LogsConfig::from_env();

        assert_eq!(config.service_name, "env-service");
        assert_eq!(config.environment, "dev");
        assert!(config.enable_stdout);
        assert_eq!(config.mirror_format, LogFormat::Json);
        assert!(config.endpoint.is_none());

        env::remove_var("OTEL_SERVICE_NAME");
        env::remove_var("DEPLOYMENT_ENVIRONMENT");
        env::remove_var("LOG_STDOUT");
        env::remove_var("LOG_FORMAT");
    }
}
