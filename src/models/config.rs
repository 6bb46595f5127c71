//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Where notices are fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Durable storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Values reported by the root manifest
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults if loading fails.
    ///
    /// The load error is handed back rather than logged, so the caller can
    /// report it once logging is set up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<AppError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::validation("server.port must be > 0"));
        }
        let base = url::Url::parse(&self.source.url)
            .map_err(|e| AppError::validation(format!("source.url is invalid: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("source.url must be http or https"));
        }
        for (name, selector) in [
            ("source.item_selector", &self.source.item_selector),
            ("source.title_selector", &self.source.title_selector),
            ("source.link_selector", &self.source.link_selector),
        ] {
            if scraper::Selector::parse(selector).is_err() {
                return Err(AppError::validation(format!(
                    "{name} is not a valid CSS selector: {selector}"
                )));
            }
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.storage.file_name.trim().is_empty() {
            return Err(AppError::validation("storage.file_name is empty"));
        }
        if self.storage.backup_prefix.trim().is_empty() {
            return Err(AppError::validation("storage.backup_prefix is empty"));
        }
        if self.storage.write_timeout_secs == 0 {
            return Err(AppError::validation("storage.write_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Notice source and extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page listing the notices; relative links resolve against it
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// Selector matching one element per notice
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Selector for the title inside an item (falls back to the item text)
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Selector for the anchor inside an item
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            link_selector: defaults::link_selector(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the data file
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::file_name")]
    pub file_name: String,

    /// Directory for backup files (defaults to `dir`)
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    #[serde(default = "defaults::backup_prefix")]
    pub backup_prefix: String,

    /// Upper bound for a single durable write
    #[serde(default = "defaults::write_timeout")]
    pub write_timeout_secs: u64,

    /// Upper bound for the final flush on shutdown
    #[serde(default = "defaults::shutdown_flush_timeout")]
    pub shutdown_flush_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            file_name: defaults::file_name(),
            backup_dir: None,
            backup_prefix: defaults::backup_prefix(),
            write_timeout_secs: defaults::write_timeout(),
            shutdown_flush_timeout_secs: defaults::shutdown_flush_timeout(),
        }
    }
}

impl StorageConfig {
    /// Directory backups are written to.
    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(|| self.dir.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "defaults::service_name")]
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: defaults::service_name(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        3000
    }

    // Source defaults
    pub fn source_url() -> String {
        "https://gurucharancollege.ac.in".into()
    }
    pub fn item_selector() -> String {
        "ul.list-group li".into()
    }
    pub fn title_selector() -> String {
        "strong".into()
    }
    pub fn link_selector() -> String {
        "a".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notice-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn file_name() -> String {
        "notices_data.json".into()
    }
    pub fn backup_prefix() -> String {
        "notices_backup".into()
    }
    pub fn write_timeout() -> u64 {
        10
    }
    pub fn shutdown_flush_timeout() -> u64 {
        5
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn service_name() -> String {
        "Guru Charan College Notices API".into()
    }
}
