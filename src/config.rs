//! Configuration file support
//!
//! Thresholds and history settings come from a `.codetrend.toml` next to
//! the analyzed workspace:
//!
//! ```toml
//! # .codetrend.toml
//!
//! [thresholds]
//! # Cyclomatic complexity above which a method counts as a violation
//! cyclomatic_complexity = 5
//!
//! # Statement count above which a method counts as too long
//! method_length = 15
//!
//! # Methods per class above which a class counts as too large
//! class_size = 10
//!
//! # Reachable classes above which a class counts as over-coupled
//! class_dependencies = 20
//!
//! [history]
//! # Checkpoint history file, appended to after each run
//! file = "quality-history.xml"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default config file name searched for in the working directory
pub const CONFIG_FILE_NAME: &str = ".codetrend.toml";

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no config file found")]
    NotFound,
}

/// Violation thresholds for the built-in collectors
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    /// Cyclomatic complexity above which a method violates
    #[serde(default = "default_cyclomatic_complexity")]
    pub cyclomatic_complexity: u32,

    /// Statement count above which a method violates
    #[serde(default = "default_method_length")]
    pub method_length: u32,

    /// Methods per class above which a class violates
    #[serde(default = "default_class_size")]
    pub class_size: usize,

    /// Reachable classes above which a class counts as over-coupled
    #[serde(default = "default_class_dependencies")]
    pub class_dependencies: usize,
}

fn default_cyclomatic_complexity() -> u32 {
    5
}

fn default_method_length() -> u32 {
    15
}

fn default_class_size() -> usize {
    10
}

fn default_class_dependencies() -> usize {
    20
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cyclomatic_complexity: default_cyclomatic_complexity(),
            method_length: default_method_length(),
            class_size: default_class_size(),
            class_dependencies: default_class_dependencies(),
        }
    }
}

/// History persistence settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HistoryConfig {
    /// Checkpoint history file, appended to after each run
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TrendConfig {
    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Load configuration from a specific file.
pub fn load_config(path: &Path) -> Result<TrendConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Search for `.codetrend.toml` in the given directory and load it.
pub fn find_config(dir: &Path) -> Result<TrendConfig, ConfigError> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        load_config(&candidate)
    } else {
        Err(ConfigError::NotFound)
    }
}
