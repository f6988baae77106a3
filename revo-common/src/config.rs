//! Configuration loading with graceful degradation
//!
//! Resolution priority for the config file location:
//! 1. Explicit path argument (highest priority)
//! 2. `REVO_CONFIG` environment variable
//! 3. Platform default (`<config_dir>/revo/config.toml`)
//! 4. Compiled defaults (no file at all)
//!
//! A missing config file never terminates the service; it logs a warning
//! and starts with defaults. An explicitly named file that cannot be read
//! or parsed is an error, since the operator clearly intended it to apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file location
pub const CONFIG_ENV_VAR: &str = "REVO_CONFIG";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub decision: DecisionPolicyConfig,
}

/// HTTP listener configuration for the workflow service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5810,
        }
    }
}

/// Backend verification service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the product/analysis backend
    pub base_url: String,
    /// Request timeout for backend calls, seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5800".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Decision policy: confidence thresholds plus the wear-based refund table.
///
/// These are operator-tunable policy values, not hard-coded law. The
/// defaults reproduce the production thresholds (0.4 / 0.6 / 0.8) and the
/// standard refund schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicyConfig {
    /// Below this confidence the decision is always routed to human review
    pub low_confidence: f64,
    /// Minimum confidence to honor a `reject` recommendation
    pub medium_confidence: f64,
    /// Minimum confidence to honor an `approve` recommendation
    pub high_confidence: f64,
    /// Refund fraction by assessed wear level
    pub refund_percent: RefundTable,
}

impl Default for DecisionPolicyConfig {
    fn default() -> Self {
        Self {
            low_confidence: 0.4,
            medium_confidence: 0.6,
            high_confidence: 0.8,
            refund_percent: RefundTable::default(),
        }
    }
}

/// Refund fraction of the purchase price, keyed by wear level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundTable {
    pub new: f64,
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
}

impl Default for RefundTable {
    fn default() -> Self {
        Self {
            new: 1.0,
            light: 0.9,
            moderate: 0.75,
            heavy: 0.5,
        }
    }
}

impl EngineConfig {
    /// Load configuration following the documented priority order.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = Self::default_path();
        match &default_path {
            Some(path) if path.exists() => Self::from_file(path),
            _ => {
                tracing::warn!(
                    "No config file found, starting with compiled defaults (looked at {:?})",
                    default_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Platform default config file path, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("revo").join("config.toml"))
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let d = &self.decision;
        for (name, value) in [
            ("low_confidence", d.low_confidence),
            ("medium_confidence", d.medium_confidence),
            ("high_confidence", d.high_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "decision.{} out of range [0,1]: {}",
                    name, value
                )));
            }
        }
        if d.low_confidence > d.medium_confidence || d.medium_confidence > d.high_confidence {
            return Err(Error::Config(format!(
                "decision thresholds must be ordered low <= medium <= high, got {} / {} / {}",
                d.low_confidence, d.medium_confidence, d.high_confidence
            )));
        }
        let r = &d.refund_percent;
        for (name, value) in [
            ("new", r.new),
            ("light", r.light),
            ("moderate", r.moderate),
            ("heavy", r.heavy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "decision.refund_percent.{} out of range [0,1]: {}",
                    name, value
                )));
            }
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}
