//! Baseline ("golden file") storage
//!
//! Every fixture has one baseline per [`Stage`], stored under the expected
//! directory next to the fixture's relative path:
//!
//! ```text
//! test.expected/sub/basicTokens.txt
//! test.expected/sub/basicTree.txt
//! test.expected/sub/basicResult.txt
//! ```
//!
//! A missing baseline is seeded from the freshly computed value. Existing
//! baselines are never rewritten; delete the file and rerun to update it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A checkpoint in the pipeline with its own baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Token dump
    Lex,
    /// Printed syntax tree
    Parse,
    /// Rendered output
    Result,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 3] = [Stage::Lex, Stage::Parse, Stage::Result];

    /// File-name suffix appended to the fixture name
    pub fn suffix(self) -> &'static str {
        match self {
            Stage::Lex => "Tokens.txt",
            Stage::Parse => "Tree.txt",
            Stage::Result => "Result.txt",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::Result => "result",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a baseline's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineState {
    /// Read from an existing file
    Recorded,
    /// Written during this call from the actual value
    Seeded,
    /// Could not be read or written; content is empty
    Unavailable,
}

/// Expected content for one fixture and stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub stage: Stage,
    pub path: PathBuf,
    pub content: String,
    pub state: BaselineState,
}

/// Baseline I/O errors
#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("failed to read baseline {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot create directory {path}: a file is in the way")]
    NotADirectory { path: PathBuf },

    #[error("failed to write baseline {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Reads and seeds baseline files
#[derive(Debug, Clone)]
pub struct GoldenStore {
    root: PathBuf,
}

impl GoldenStore {
    /// Create a store rooted at `base_dir/expected_dir`
    pub fn new(base_dir: impl AsRef<Path>, expected_dir: impl AsRef<Path>) -> Self {
        Self {
            root: base_dir.as_ref().join(expected_dir),
        }
    }

    /// Directory holding all baselines
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the baseline for a fixture and stage.
    ///
    /// `fixture` is a discovered name, which already has its extension
    /// removed; the stage suffix is appended as is, so `notes` and
    /// `notes.v2` get separate baselines.
    pub fn baseline_path(&self, stage: Stage, fixture: &str) -> PathBuf {
        self.root.join(format!("{}{}", fixture, stage.suffix()))
    }

    /// Read a recorded baseline without seeding.
    ///
    /// Returns `Ok(None)` when no baseline exists yet.
    pub fn read(&self, stage: Stage, fixture: &str) -> Result<Option<String>, GoldenError> {
        let path = self.baseline_path(stage, fixture);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| GoldenError::Read { path, source })
    }

    /// Return the expected content for a fixture and stage, seeding the
    /// baseline from `actual` if none is recorded.
    ///
    /// A seeded baseline reports `actual` as its content, so a brand-new
    /// fixture compares equal on its first run. I/O failures are logged and
    /// yield an [`BaselineState::Unavailable`] baseline with empty content.
    pub fn read_or_seed(&self, stage: Stage, fixture: &str, actual: &str) -> Baseline {
        let path = self.baseline_path(stage, fixture);

        let (content, state) = if path.exists() {
            match self.read(stage, fixture) {
                Ok(Some(content)) => (content, BaselineState::Recorded),
                Ok(None) => {
                    tracing::error!(path = %path.display(), "baseline path is not a file");
                    (String::new(), BaselineState::Unavailable)
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    (String::new(), BaselineState::Unavailable)
                }
            }
        } else {
            match seed(&path, actual) {
                Ok(()) => {
                    tracing::info!(%stage, fixture, path = %path.display(), "seeded baseline");
                    (actual.to_string(), BaselineState::Seeded)
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    (String::new(), BaselineState::Unavailable)
                }
            }
        };

        Baseline {
            stage,
            path,
            content,
            state,
        }
    }
}

/// Write a new baseline, creating parent directories as needed
fn seed(path: &Path, content: &str) -> Result<(), GoldenError> {
    if let Some(parent) = path.parent() {
        if parent.is_file() {
            return Err(GoldenError::NotADirectory {
                path: parent.to_path_buf(),
            });
        }
        fs::create_dir_all(parent).map_err(|source| GoldenError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| GoldenError::Write {
        path: path.to_path_buf(),
        source,
    })
}
