//! # Configuration
//!
//! Optional `termstore.toml`:
//!
//! ```toml
//! [store]
//! path = "termstore.redb"
//! spine_size = 10240
//!
//! [log]
//! format = "text"   # or "json"
//! filter = "termstore=info"
//! ```
//!
//! Missing sections and keys take their defaults. Command-line flags
//! override file values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use termstore_core::primitives::DEFAULT_SPINE_SIZE;
use termstore_core::{SpineConfig, TermstoreError};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "termstore.toml";

/// Largest config file we are willing to parse (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub spine_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("termstore.redb"),
            spine_size: DEFAULT_SPINE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "termstore=info".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate TOML text.
    pub fn parse(text: &str) -> Result<Self, TermstoreError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| TermstoreError::InvalidConfig(format!("termstore.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit`, or `termstore.toml` in the working directory when it
    /// exists, or the defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TermstoreError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            TermstoreError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(TermstoreError::InvalidConfig(format!(
                "Config file {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            TermstoreError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn validate(&self) -> Result<(), TermstoreError> {
        self.spine_config().validate()
    }

    #[must_use]
    pub fn spine_config(&self) -> SpineConfig {
        SpineConfig::with_spine_size(self.store.spine_size)
    }
}
