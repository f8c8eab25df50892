//! # Configuration
//!
//! Layered configuration for the Tumbuh binary:
//!
//! 1. Built-in defaults
//! 2. `tumbuh.toml` (when `--config` is given)
//! 3. Environment variables
//! 4. CLI flags (applied by the command layer)
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [reference]
//! dir = "/srv/who-2006"
//!
//! [evaluator]
//! restrict_tails = false
//! ```
//!
//! ## Environment Variables
//!
//! - `TUMBUH_HOST`, `TUMBUH_PORT`: server bind address
//! - `TUMBUH_REFERENCE_DIR`: load reference CSVs from this directory
//! - `TUMBUH_RESTRICT_TAILS`: `true`/`false`

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tumbuh_core::{Evaluator, EvaluatorConfig, GrowthError, ReferenceSet};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Directory of `<code>_<boys|girls>.csv` files. `None` uses the
    /// embedded WHO tables.
    pub dir: Option<PathBuf>,
}

/// Complete binary configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub reference: ReferenceConfig,
    pub evaluator: EvaluatorConfig,
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, GrowthError> {
        toml::from_str(content).map_err(|e| GrowthError::Config(e.to_string()))
    }

    /// Read a TOML file. A missing file is an error: it was asked for.
    pub fn from_file(path: &Path) -> Result<Self, GrowthError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GrowthError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GrowthError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TUMBUH_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), GrowthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("TUMBUH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("TUMBUH_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| GrowthError::Config(format!("TUMBUH_PORT: invalid port '{port}'")))?;
        }
        if let Some(dir) = var("TUMBUH_REFERENCE_DIR") {
            self.reference.dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = var("TUMBUH_RESTRICT_TAILS") {
            self.evaluator.restrict_tails = parse_bool(&flag).ok_or_else(|| {
                GrowthError::Config(format!("TUMBUH_RESTRICT_TAILS: expected true/false, got '{flag}'"))
            })?;
        }
        Ok(())
    }

    /// Load the configured reference tables.
    pub fn load_reference(&self) -> Result<Arc<ReferenceSet>, GrowthError> {
        let set = match &self.reference.dir {
            Some(dir) => ReferenceSet::from_dir(dir)?,
            None => ReferenceSet::embedded()?,
        };
        Ok(Arc::new(set))
    }

    /// Build an evaluator from this configuration.
    pub fn evaluator(&self) -> Result<Evaluator, GrowthError> {
        Ok(Evaluator::new(self.load_reference()?, self.evaluator))
    }

    /// `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
