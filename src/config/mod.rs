//! Harness configuration (`snippets.toml`)
//!
//! Every option has a default, so an empty file (or no file at all) gives a
//! working configuration rooted at the base directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::printer::{PrintConfig, LINE_ENDING};

/// Name of the optional configuration file in a base directory
pub const CONFIG_FILE: &str = "snippets.toml";

/// Static configuration of a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Root for fixtures and baselines
    pub base_dir: PathBuf,

    /// Fixture directory, relative to `base_dir`
    pub data_dir: String,

    /// Baseline directory, relative to `base_dir`
    pub expected_dir: String,

    /// Fixture file extensions, with or without the leading dot
    pub extensions: Vec<String>,

    /// How many directory levels below the data directory are searched
    pub max_depth: usize,

    /// Mirror computed values to the console
    pub echo: bool,

    /// Include hidden-channel tokens in the token dump
    pub hidden_tokens: bool,

    /// Echo the token dump
    pub echo_lex: bool,

    /// Echo the printed tree
    pub echo_tree: bool,

    /// Echo the rendered result
    pub echo_result: bool,

    /// Print trees in indented form instead of the compact form
    pub tree_pretty: bool,

    /// Indent unit for pretty-printed trees
    pub indent: String,

    /// Only run fixtures whose name matches this regex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Report freshly seeded baselines as failures
    pub fail_on_seed: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            data_dir: "test.snippets".to_string(),
            expected_dir: "test.expected".to_string(),
            extensions: vec!["md".to_string()],
            max_depth: 1,
            echo: true,
            hidden_tokens: false,
            echo_lex: true,
            echo_tree: true,
            echo_result: true,
            tree_pretty: true,
            indent: "  ".to_string(),
            filter: None,
            fail_on_seed: false,
        }
    }
}

impl HarnessConfig {
    /// Default configuration rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Load `snippets.toml` from `base_dir` if present, otherwise use the
    /// defaults. `base_dir` always overrides any `base_dir` in the file.
    pub fn for_base_dir(base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base_dir = base_dir.into();
        let file = base_dir.join(CONFIG_FILE);
        let mut config = if file.is_file() {
            Self::load(&file)?
        } else {
            Self::default()
        };
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Check option values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Validation(
                "at least one fixture extension is required".to_string(),
            ));
        }
        if let Some(filter) = &self.filter {
            regex::Regex::new(filter)
                .map_err(|e| ConfigError::Validation(format!("invalid filter: {}", e)))?;
        }
        Ok(())
    }

    /// Fixture directory
    pub fn data_root(&self) -> PathBuf {
        self.base_dir.join(&self.data_dir)
    }

    /// Printer settings derived from this configuration
    pub fn print_config(&self) -> PrintConfig {
        PrintConfig {
            pretty: self.tree_pretty,
            indent: self.indent.clone(),
            line_ending: LINE_ENDING.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
