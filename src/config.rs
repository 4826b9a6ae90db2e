//! TOML configuration.
//!
//! Only `[db]` and `[server]` are required; `[catalog]` and `[logging]`
//! fall back to defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_related_page_size")]
    pub related_page_size: i64,
    #[serde(default = "default_like_max_attempts")]
    pub like_max_attempts: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            related_page_size: default_related_page_size(),
            like_max_attempts: default_like_max_attempts(),
        }
    }
}

fn default_page_size() -> i64 {
    10
}
fn default_related_page_size() -> i64 {
    6
}
fn default_like_max_attempts() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if config.catalog.default_page_size < 1 {
        anyhow::bail!("catalog.default_page_size must be >= 1");
    }
    if config.catalog.related_page_size < 1 {
        anyhow::bail!("catalog.related_page_size must be >= 1");
    }
    if config.catalog.like_max_attempts == 0 {
        anyhow::bail!("catalog.like_max_attempts must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}
