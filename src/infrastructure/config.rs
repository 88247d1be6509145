use crate::domain::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "product-reviews";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Prefix mounted in front of every review route, e.g. "/api"
    #[serde(default)]
    pub base_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_enable")]
    pub enabled: bool,
    #[serde(default = "default_enable")]
    pub warm_on_start: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            base_path: String::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warm_on_start: true,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: default_log_level(),
        }
    }
}

// Defaults
fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "INFO".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
}

/// Explicit `--config` path if given, otherwise the default location.
pub fn resolve_config_path(path: Option<&Path>) -> Option<PathBuf> {
    path.map(Path::to_path_buf).or_else(get_config_path)
}

/// Database path from config, or the config directory by default
pub fn get_database_path(config: &Config) -> PathBuf {
    if let Some(path) = config.database.path.as_deref().filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    // ~/.config/product-reviews/reviews.db (Linux)
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("reviews.db")
}

/// Loads `path`, or the default config location when `path` is `None`.
///
/// A missing file yields defaults; a malformed one is reported and also
/// yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ReviewError> {
    if let Some(path) = resolve_config_path(path) {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            match parse_config(&content) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config file: {}. Using defaults.",
                        e
                    );
                }
            }
        }
    }

    Ok(Config::default())
}

pub fn parse_config(content: &str) -> Result<Config, ReviewError> {
    Ok(toml::from_str::<Config>(content)?)
}

pub fn generate_config_sample(path: Option<&Path>) -> Result<PathBuf, ReviewError> {
    let path = resolve_config_path(path)
        .ok_or_else(|| ReviewError::Config("Cannot determine config directory".to_string()))?;

    if path.exists() {
        eprintln!("Config file already exists at: {}", path.display());
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let sample = Config::default();
    let toml_content = toml::to_string_pretty(&sample)
        .map_err(|e| ReviewError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(&path, toml_content)
        .map_err(|e| ReviewError::Config(format!("Failed to write config file: {}", e)))?;

    Ok(path)
}
