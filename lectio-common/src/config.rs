//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Everything in it
//! is optional; a missing file logs a warning and falls back to built-in
//! defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "LECTIO_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "lectio.db";

pub const DEFAULT_API_BASE_URL: &str = "https://www.abibliadigital.com.br/api";
pub const DEFAULT_CORPUS_URL: &str =
    "https://raw.githubusercontent.com/thiagobodruk/biblia/master/json/acf.json";
pub const DEFAULT_PORT: u16 = 5730;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Folder holding the local database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the remote Bible REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Static URL of the full corpus document for the primary offline edition
    #[serde(default = "default_corpus_url")]
    pub corpus_url: String,

    /// Bearer token for the remote API (optional, raises its rate limit)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout for remote calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            api_base_url: default_api_base_url(),
            corpus_url: default_corpus_url(),
            api_token: None,
            http_timeout_secs: default_http_timeout_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_corpus_url() -> String {
    DEFAULT_CORPUS_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default config file location: `<config_dir>/lectio/lectio.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectio").join("lectio.toml"))
}

/// Load the TOML bootstrap config
///
/// A missing file is not an error: defaults are returned with a warning.
/// A file that exists but does not parse is a `Config` error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lectio
        dirs::data_local_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lectio"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lectio
        dirs::data_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lectio"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lectio
        dirs::data_local_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lectio"))
    } else {
        PathBuf::from("./lectio_data")
    }
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}
