//! Configuration loading and types for bulkupload.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct. Every section has defaults, so an empty file yields
//! a working in-memory setup.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upload protocol settings.
    #[serde(default)]
    pub uploader: UploaderConfig,

    /// Object store adapter settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Upload protocol configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploaderConfig {
    /// Bucket every upload object lives in.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Public domain used to build object URLs
    /// (`https://<bucket>.<domain>/<object>`).
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Run test-and-create on the bucket at startup.
    #[serde(default = "default_true")]
    pub create_bucket: bool,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            domain: default_domain(),
            create_bucket: true,
        }
    }
}

/// Object store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `memory` or `aws`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// AWS S3 configuration.
    #[serde(default)]
    pub aws: Option<AwsStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            aws: None,
        }
    }
}

/// AWS S3 configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsStorageConfig {
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: bool,
    /// Explicit AWS access key (falls back to env/credential chain).
    #[serde(default)]
    pub access_key_id: String,
    /// Explicit AWS secret key (falls back to env/credential chain).
    #[serde(default)]
    pub secret_access_key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics: true }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9013
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_bucket() -> String {
    "bulkupload".to_string()
}

fn default_domain() -> String {
    crate::meta::s3::DEFAULT_DOMAIN.to_string()
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_config(&contents)
}

/// Parse configuration from YAML text. An empty document yields defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
}

/// Turn an empty config string into `None`.
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.port, 9013);
        assert_eq!(config.uploader.bucket, "bulkupload");
        assert_eq!(config.uploader.domain, "s3.amazonaws.com");
        assert!(config.uploader.create_bucket);
        assert_eq!(config.storage.backend, "memory");
        assert!(config.storage.aws.is_none());
        assert_eq!(config.logging.format, "text");
        assert!(config.observability.metrics);
    }

    #[test]
    fn test_parse_aws_section() {
        let yaml = r#"
uploader:
  bucket: testforunittest
  create_bucket: false
storage:
  backend: aws
  aws:
    region: ap-southeast-1
    endpoint_url: http://localhost:9000
    use_path_style: true
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.uploader.bucket, "testforunittest");
        assert!(!config.uploader.create_bucket);
        assert_eq!(config.storage.backend, "aws");
        let aws = config.storage.aws.unwrap();
        assert_eq!(aws.region, "ap-southeast-1");
        assert_eq!(non_empty(&aws.endpoint_url).as_deref(), Some("http://localhost:9000"));
        assert!(aws.use_path_style);
        assert_eq!(non_empty(&aws.access_key_id), None);
    }

    #[test]
    fn test_partial_section_keeps_field_defaults() {
        let config = parse_config("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.shutdown_timeout, 30);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: debug\n  format: json").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/bulkupload.yaml").is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(parse_config("server: [unterminated").is_err());
    }
}
