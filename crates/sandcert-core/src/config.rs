//! Configuration management for sandcert.
//!
//! Settings can come from three places, in increasing precedence:
//! - built-in defaults (nginx on a Debian-style layout)
//! - an optional YAML file, with `SANDCERT__*` environment overrides
//! - command-line flags, applied by the binary on top of the loaded config

use crate::error::{ConfigError, Result, SandcertError};
use crate::types::Source;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Restart command value that disables restarting the reverse proxy.
pub const RESTART_DISABLED: &str = "None";

/// Main application configuration.
///
/// # Examples
///
/// ```
/// use sandcert_core::config::AppConfig;
///
/// let config = AppConfig::from_yaml(
///     "source:\n  local_dir: /tmp\ndestination:\n  dir: /etc/nginx/ssl\n",
/// )
/// .unwrap();
/// assert_eq!(config.destination.cert_filename, "sandstorm.pem");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the sandcats artifacts are read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Where the certificate and key are installed
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Reverse proxy restart settings
    #[serde(default)]
    pub restart: RestartConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate: an optional file plus
    /// environment overrides (`SANDCERT__DESTINATION__DIR=/srv/ssl`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SANDCERT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "environment".to_string()),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// Checks for:
    /// - exactly one source configured
    /// - a local source directory that exists
    /// - bare destination file names, without directories
    ///
    /// A missing destination directory is not an error here, the installer
    /// only warns about it at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        if let Source::Local(dir) = self.source.resolve()? {
            if !dir.exists() {
                return Err(SandcertError::SourceUnavailable { path: dir });
            }
        }

        self.destination.validate()?;
        self.logging.parse_level()?;

        Ok(())
    }
}

/// Source directory settings. Exactly one of the two must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local directory holding the sandcats certificates and keys
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// Directory inside an LXD container, as `container_name/path/to/dir`
    #[serde(default)]
    pub lxd_dir: Option<String>,
}

impl SourceConfig {
    /// Resolves the configured source.
    pub fn resolve(&self) -> Result<Source> {
        match (&self.local_dir, &self.lxd_dir) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSources.into()),
            (Some(dir), None) => Ok(Source::Local(dir.clone())),
            (None, Some(locator)) => Ok(Source::Lxd(locator.clone())),
            (None, None) => Err(ConfigError::NoSource.into()),
        }
    }
}

/// Destination directory and file names read by the reverse proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Where the certificate files are copied
    #[serde(default = "default_dest_dir")]
    pub dir: PathBuf,

    /// File name of the certificate on the destination
    #[serde(default = "default_cert_filename")]
    pub cert_filename: String,

    /// File name of the private key on the destination
    #[serde(default = "default_key_filename")]
    pub key_filename: String,
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/ssl")
}

fn default_cert_filename() -> String {
    "sandstorm.pem".to_string()
}

fn default_key_filename() -> String {
    "sandstorm.key".to_string()
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            dir: default_dest_dir(),
            cert_filename: default_cert_filename(),
            key_filename: default_key_filename(),
        }
    }
}

impl DestinationConfig {
    fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("destination.cert_filename", &self.cert_filename),
            ("destination.key_filename", &self.key_filename),
        ] {
            if name.is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty").into());
            }
            if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
                return Err(ConfigError::invalid_value(
                    field,
                    "use just the file name, without directories",
                )
                .into());
            }
        }

        if self.cert_filename == self.key_filename {
            return Err(ConfigError::invalid_value(
                "destination.key_filename",
                "must differ from the certificate file name",
            )
            .into());
        }

        Ok(())
    }
}

/// Reverse proxy restart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Shell command restarting the reverse proxy, `None` to handle it externally
    #[serde(default = "default_restart_command")]
    pub command: String,
}

fn default_restart_command() -> String {
    "sudo systemctl restart nginx".to_string()
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            command: default_restart_command(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.level),
            }
            .into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::new();
        config.source.local_dir = Some(dir.to_path_buf());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.destination.dir, PathBuf::from("/etc/nginx/ssl"));
        assert_eq!(config.destination.cert_filename, "sandstorm.pem");
        assert_eq!(config.destination.key_filename, "sandstorm.key");
        assert_eq!(config.restart.command, "sudo systemctl restart nginx");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_config_validation_no_source() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, SandcertError::Config(ConfigError::NoSource)));
    }

    #[test]
    fn test_config_validation_conflicting_sources() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = local_config(temp_dir.path());
        config.source.lxd_dir = Some("sandstorm/opt/sandstorm/var/sandcats/https".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SandcertError::Config(ConfigError::ConflictingSources)));
    }

    #[test]
    fn test_config_validation_missing_local_source() {
        let temp_dir = TempDir::new().unwrap();
        let config = local_config(&temp_dir.path().join("missing"));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SandcertError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_config_validation_rejects_directories_in_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = local_config(temp_dir.path());
        config.destination.key_filename = "private/sandstorm.key".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            SandcertError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "destination.key_filename"
        ));
    }

    #[test]
    fn test_config_validation_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert!(local_config(temp_dir.path()).validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
source:
  lxd_dir: sandstorm/opt/sandstorm/var/sandcats/https
destination:
  dir: /srv/ssl
  cert_filename: box.pem
restart:
  command: None
logging:
  level: debug
  format: json
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.source.resolve().unwrap(),
            Source::Lxd("sandstorm/opt/sandstorm/var/sandcats/https".to_string())
        );
        assert_eq!(config.destination.dir, PathBuf::from("/srv/ssl"));
        assert_eq!(config.destination.cert_filename, "box.pem");
        assert_eq!(config.destination.key_filename, "sandstorm.key");
        assert_eq!(config.restart.command, RESTART_DISABLED);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_from_invalid_yaml() {
        let err = AppConfig::from_yaml("destination: [1, 2").unwrap_err();
        assert!(matches!(err, SandcertError::Config(ConfigError::InvalidFormat { .. })));
    }

    #[test]
    fn test_config_builder_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sandcert.yaml");
        std::fs::write(
            &path,
            "destination:\n  dir: /srv/ssl\nrestart:\n  command: \"nginx -s reload\"\n",
        )
        .unwrap();

        let config = AppConfig::from_config_builder(Some(&path)).unwrap();
        assert_eq!(config.destination.dir, PathBuf::from("/srv/ssl"));
        assert_eq!(config.restart.command, "nginx -s reload");
    }

    #[test]
    fn test_config_builder_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = AppConfig::from_config_builder(Some(&temp_dir.path().join("nope.yaml")))
            .unwrap_err();
        assert!(matches!(err, SandcertError::Config(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_logging_parse_level() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.parse_level().unwrap(), Level::INFO);

        logging.level = "debug".to_string();
        assert_eq!(logging.parse_level().unwrap(), Level::DEBUG);

        logging.level = "loud".to_string();
        assert!(logging.parse_level().is_err());
    }
}
