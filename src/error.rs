//! Crate-level error type

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::golden::GoldenError;
use crate::pipeline::PipelineError;

/// Errors surfaced by the harness
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The base directory cannot be used; nothing can run
    #[error("base directory {path} is not readable: {source}")]
    BaseDir { path: PathBuf, source: io::Error },

    #[error("failed to read fixture {path}: {source}")]
    Source { path: PathBuf, source: io::Error },

    #[error("no source file for fixture '{0}'")]
    MissingFixture(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Golden(#[from] GoldenError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
