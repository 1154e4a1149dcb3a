use std::path::PathBuf;
use std::str::FromStr;

use restx_core::docs::{self, Documentation};

/// A configuration value that is missing or could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Settings for the view and schema layer.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Enables warnings about views without documentation overrides.
    pub debug: bool,
    /// Directories scanned for `*.yaml` documentation overrides.
    pub additional_docs_dirs: Vec<PathBuf>,
    /// `info.title` of the generated OpenAPI document.
    pub title: String,
    /// `info.version` of the generated OpenAPI document.
    pub version: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            debug: false,
            additional_docs_dirs: Vec::new(),
            title: "restx".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ApiSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                | Default            |
    /// |------------------------|--------------------|
    /// | `DEBUG`                | `false`            |
    /// | `ADDITIONAL_DOCS_DIRS` | (none)             |
    /// | `API_TITLE`            | `restx`            |
    /// | `API_VERSION`          | crate version      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let debug = match std::env::var("DEBUG") {
            Ok(raw) => parse_bool("DEBUG", &raw)?,
            Err(_) => defaults.debug,
        };

        let additional_docs_dirs = std::env::var("ADDITIONAL_DOCS_DIRS")
            .map(|raw| split_list(&raw).into_iter().map(PathBuf::from).collect())
            .unwrap_or_default();

        Ok(Self {
            debug,
            additional_docs_dirs,
            title: std::env::var("API_TITLE").unwrap_or(defaults.title),
            version: std::env::var("API_VERSION").unwrap_or(defaults.version),
        })
    }

    /// The process-wide documentation table, loaded on first call.
    pub fn documentation(&self) -> &'static Documentation {
        docs::global(&self.additional_docs_dirs)
    }
}

/// Read `var` and parse it, falling back to `default` when unset.
pub fn env_or<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value: raw.to_string(),
        }),
    }
}
