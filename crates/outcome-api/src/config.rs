//! Server configuration
//!
//! Every key has a default, so the file is optional. Command-line flags and
//! environment variables are applied on top by the binary.

use outcome_core::ArtifactPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Upper bound on request body size
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Artifact locations
///
/// Each file defaults to its standard name inside `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSection {
    pub dir: PathBuf,
    pub columns: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub model: Option<PathBuf>,
}

impl Default for ArtifactSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            columns: None,
            scaler: None,
            categories: None,
            model: None,
        }
    }
}

impl ArtifactSection {
    pub fn paths(&self) -> ArtifactPaths {
        let defaults = ArtifactPaths::in_dir(&self.dir);
        ArtifactPaths {
            columns: self.columns.clone().unwrap_or(defaults.columns),
            scaler: self.scaler.clone().unwrap_or(defaults.scaler),
            categories: self.categories.clone().unwrap_or(defaults.categories),
            model: self.model.clone().unwrap_or(defaults.model),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub artifacts: ArtifactSection,
    pub telemetry: TelemetrySection,
}

impl ServiceConfig {
    /// Load from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be non-zero".into(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.artifacts.dir, PathBuf::from("artifacts"));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert!(config.telemetry.metrics_enabled);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ServiceConfig::from_toml(
            r#"
            [server]
            port = 9100

            [telemetry]
            log_format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert!(config.telemetry.metrics_enabled);
    }

    #[test]
    fn test_artifact_overrides() {
        let config = ServiceConfig::from_toml(
            r#"
            [artifacts]
            dir = "/srv/model"
            model = "/srv/candidates/model.json"
            "#,
        )
        .unwrap();

        let paths = config.artifacts.paths();
        assert_eq!(paths.columns, PathBuf::from("/srv/model/model_columns.json"));
        assert_eq!(paths.model, PathBuf::from("/srv/candidates/model.json"));
    }

    #[test]
    fn test_rejects_zero_port() {
        let err = ServiceConfig::from_toml("[server]\nport = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_body_limit() {
        let err = ServiceConfig::from_toml("[server]\nmax_body_bytes = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = 1").unwrap();

        let err = ServiceConfig::load(Some(file.path())).unwrap_err();
        let ConfigError::Parse { path, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!(path, file.path());
    }

    #[test]
    fn test_load_without_file() {
        assert_eq!(ServiceConfig::load(None).unwrap(), ServiceConfig::default());
    }
}
