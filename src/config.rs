//! Configuration
//!
//! Loaded from a TOML file; every section and key is optional. Lookup order
//! for the file: explicit path, `EXPENSE_TRACKER_CONFIG`, then
//! `<config_dir>/expense-tracker/config.toml`. Only the default location may
//! be missing; a path the user named must exist.

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "EXPENSE_TRACKER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How amounts and dates are rendered
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// chrono format string for the created-at column
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%b %d, %Y %H:%M".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            date_format: default_date_format(),
        }
    }
}

impl DisplayConfig {
    /// Reject date formats chrono cannot render
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("invalid display.date_format '{}'", self.date_format);
        }
        Ok(())
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG wins when set
    #[serde(default = "default_level")]
    pub level: String,

    /// Write logs here instead of the terminal
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load the requested config file, or the default one when nothing was
    /// requested. A requested file that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = Self::requested_path(explicit) {
            if !path.exists() {
                bail!("Config file {} does not exist", path.display());
            }
            return Self::from_file(&path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.display.validate()?;
        Ok(config)
    }

    /// The path `load` reads, if any
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        Self::requested_path(explicit).or_else(Self::default_path)
    }

    /// Explicit path, else a non-empty `EXPENSE_TRACKER_CONFIG`
    fn requested_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        std::env::var(CONFIG_ENV)
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("expense-tracker").join("config.toml"))
    }
}
