//! Configuration management
//!
//! Loads optional defaults from a TOML file. Anything given on the command
//! line takes precedence over what is found here.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Default target and credentials
    #[serde(default)]
    pub controller: ControllerConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults for the connection flags
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ControllerConfig {
    pub ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HttpConfig {
    /// Verify the controller's TLS certificate
    #[serde(default)]
    pub verify_tls: bool,

    /// Request timeout in seconds, unset leaves the transport default
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds
    #[serde(default)]
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `explicit` if given, otherwise from the first
    /// standard location that exists, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::from_file(path);
        }

        let config_paths = vec![
            PathBuf::from("idrac-oob.toml"),
            PathBuf::from("/etc/idrac-oob/config.toml"),
            dirs::home_dir()
                .map(|h| h.join(".config/idrac-oob/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                return Self::from_file(path);
            }
        }

        // Logging is not up yet, so nothing to report here
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [controller]
            ip = "192.168.0.120"
            username = "root"

            [http]
            verify_tls = true
            timeout = 30

            [logging]
            level = "debug"
            "#
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.controller.ip.as_deref(), Some("192.168.0.120"));
        assert_eq!(cfg.controller.username.as_deref(), Some("root"));
        assert!(cfg.controller.password.is_none());
        assert!(cfg.http.verify_tls);
        assert_eq!(cfg.http.timeout, Some(30));
        assert_eq!(cfg.http.connect_timeout, None);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert!(!cfg.http.verify_tls);
        assert!(cfg.http.timeout.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.controller.ip.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nverify_tls = \"maybe\"").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
