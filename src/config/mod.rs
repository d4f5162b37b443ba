//! Configuration management for taxonomy-explorer.
//!
//! Handles:
//! - API endpoint and page sizes
//! - Tree assembly mode
//! - Theme and display settings
//! - Child page cache bound

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};
use crate::reconstruction::AssemblyMode;
use crate::util::atomic_write;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Tree assembly settings.
    #[serde(default)]
    pub tree: TreeConfig,
    /// TUI theme.
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Display options.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Every key accepted by [`Config::get_value`] and [`Config::set_value`].
pub const CONFIG_KEYS: &[&str] = &[
    "api.base_url",
    "api.timeout_secs",
    "api.page_size",
    "api.search_page_size",
    "tree.assembly",
    "theme.name",
    "theme.unicode",
    "display.show_sizes",
    "cache.max_nodes",
];

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(path),
            Some(_) => Ok(Self::default()),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ExplorerError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 || self.api.search_page_size == 0 {
            return Err(ExplorerError::InvalidConfig {
                message: "page sizes must be at least 1".to_string(),
            });
        }
        if self.cache.max_nodes == 0 {
            return Err(ExplorerError::InvalidConfig {
                message: "cache.max_nodes must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    ///
    /// Uses atomic file writes to ensure configuration integrity.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ExplorerError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())
    }

    /// Read a value by dotted key.
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.timeout_secs" => self.api.timeout_secs.to_string(),
            "api.page_size" => self.api.page_size.to_string(),
            "api.search_page_size" => self.api.search_page_size.to_string(),

            "tree.assembly" => self.tree.assembly.to_string(),

            "theme.name" => self.theme.name.clone(),
            "theme.unicode" => self.theme.unicode.to_string(),

            "display.show_sizes" => self.display.show_sizes.to_string(),

            "cache.max_nodes" => self.cache.max_nodes.to_string(),

            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a value by dotted key, parsing it to the field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => self.api.base_url = value.trim_end_matches('/').to_string(),
            "api.timeout_secs" => self.api.timeout_secs = parse_number(value)?,
            "api.page_size" => self.api.page_size = parse_number(value)?,
            "api.search_page_size" => self.api.search_page_size = parse_number(value)?,

            "tree.assembly" => {
                self.tree.assembly = value.parse().map_err(|_| ExplorerError::ConfigError {
                    message: format!("Invalid assembly mode: {value}. Use strict/lenient."),
                })?;
            }

            "theme.name" => self.theme.name = value.to_string(),
            "theme.unicode" => self.theme.unicode = parse_bool(value)?,

            "display.show_sizes" => self.display.show_sizes = parse_bool(value)?,

            "cache.max_nodes" => self.cache.max_nodes = parse_number(value)?,

            _ => return Err(unknown_key(key)),
        }
        self.validate()
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the endpoints hang off.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Children page size.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Search results page size.
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            page_size: default_page_size(),
            search_page_size: default_search_page_size(),
        }
    }
}

/// Tree assembly configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// How rows that break the input contract are handled.
    #[serde(default)]
    pub assembly: AssemblyMode,
}

/// Theme configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme name.
    #[serde(default = "default_theme")]
    pub name: String,
    /// Use Unicode characters.
    #[serde(default = "default_true")]
    pub unicode: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: default_theme(),
            unicode: true,
        }
    }
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show descendant counts next to node names.
    #[serde(default = "default_true")]
    pub show_sizes: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { show_sizes: true }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of nodes whose children are held.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

fn default_search_page_size() -> usize {
    20
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_max_nodes() -> usize {
    2048
}

fn unknown_key(key: &str) -> ExplorerError {
    ExplorerError::ConfigError {
        message: format!(
            "Unknown configuration key: {key}. Valid keys: {}",
            CONFIG_KEYS.join(", ")
        ),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ExplorerError::ConfigError {
            message: format!("Invalid boolean value: {s}. Use true/false."),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T> {
    s.parse().map_err(|_| ExplorerError::ConfigError {
        message: format!("Invalid number: {s}"),
    })
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ExplorerError::unsupported("config directory discovery"))?;

    Ok(config_dir.join("taxonomy-explorer").join("config.toml"))
}
