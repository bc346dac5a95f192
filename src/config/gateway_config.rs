//! Gateway Configuration - deployment settings as operator-tunable TOML values
//!
//! Every struct implements `Default` with values from [`super::defaults`],
//! ensuring the gateway runs with zero configuration present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a gateway deployment.
///
/// Load with `GatewayConfig::load()` which searches:
/// 1. `$EPIGATE_CONFIG` env var
/// 2. `./gateway.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// External analysis pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, `host:port`
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// External analysis pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline executable, invoked once per completed cycle with the
    /// artifact paths as trailing arguments
    #[serde(default = "default_program")]
    pub program: String,

    /// Fixed arguments inserted before the artifact paths
    #[serde(default)]
    pub args: Vec<String>,

    /// Bound on one pipeline run (seconds); expiry counts as failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory where interchange artifacts are written
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

fn default_program() -> String {
    defaults::PIPELINE_PROGRAM.to_string()
}

fn default_timeout_secs() -> u64 {
    defaults::DISPATCH_TIMEOUT_SECS
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(defaults::ARTIFACT_DIR)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

impl PipelineConfig {
    /// Dispatch timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GatewayConfig {
    /// Load configuration using the standard search order:
    /// 1. `$EPIGATE_CONFIG` environment variable
    /// 2. `./gateway.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("EPIGATE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded gateway config from EPIGATE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from EPIGATE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "EPIGATE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("gateway.toml");
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded gateway config");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./gateway.toml, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load and parse a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Validate the configuration, collecting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.pipeline.program.trim().is_empty() {
            errors.push("pipeline.program must not be empty".to_string());
        }
        if self.pipeline.timeout_secs == 0 {
            errors.push("pipeline.timeout_secs must be greater than zero".to_string());
        }
        if self.pipeline.artifact_dir.as_os_str().is_empty() {
            errors.push("pipeline.artifact_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}
