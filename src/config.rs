// ⚙️ Configuration - JSON file + environment overrides
//
// Lookup order (later wins):
//   1. defaults
//   2. file named by DEX_BOARD_CONFIG
//   3. DEX_BOARD_ENTRIES / DEX_BOARD_ADDR / DEX_BOARD_LOG

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DEX_BOARD_CONFIG";
pub const ENTRIES_ENV: &str = "DEX_BOARD_ENTRIES";
pub const ADDR_ENV: &str = "DEX_BOARD_ADDR";
pub const LOG_ENV: &str = "DEX_BOARD_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line fields
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// EnvFilter directive ("info", "dex_board=debug", ...); RUST_LOG wins
    pub level: String,
    pub format: LogFormat,
    /// Log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// JSON payload the entry source reads
    pub entries_path: PathBuf,
    /// Bind address of the HTTP front end
    pub server_addr: String,
    pub log: LogSettings,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            entries_path: PathBuf::from("data/entries.json"),
            server_addr: "127.0.0.1:3000".to_string(),
            log: LogSettings::default(),
        }
    }
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the DEX_BOARD_CONFIG file, then single-value overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENTRIES_ENV) {
            self.entries_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup(ADDR_ENV) {
            self.server_addr = addr;
        }
        if let Some(level) = lookup(LOG_ENV) {
            self.log.level = level;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
