//! Fixture discovery
//!
//! Walks the fixture directory and returns every file with a configured
//! extension, down to a fixed depth below the fixture root.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::config::{ConfigError, HarnessConfig};
use crate::golden::{GoldenStore, Stage};

/// A source fixture and the baselines derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// Path relative to the fixture root, `/`-separated, without extension
    pub name: String,
    /// Source file
    pub source: PathBuf,
    baselines: [PathBuf; 3],
}

impl Fixture {
    /// Create a fixture, deriving its baseline paths from `store`
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, store: &GoldenStore) -> Self {
        let name = name.into();
        let baselines = Stage::ALL.map(|stage| store.baseline_path(stage, &name));
        Self {
            name,
            source: source.into(),
            baselines,
        }
    }

    /// Baseline file for a stage
    pub fn baseline(&self, stage: Stage) -> &Path {
        let index = match stage {
            Stage::Lex => 0,
            Stage::Parse => 1,
            Stage::Result => 2,
        };
        &self.baselines[index]
    }
}

/// Find fixture names below `base_dir/data_dir`.
///
/// Directories more than `max_depth_offset` levels below the fixture root
/// are skipped along with everything inside them. A missing root gives an
/// empty list. Names are relative to the root, `/`-separated and have their
/// extension removed. Entries are visited in file-name order, so the result
/// is the same on every platform.
pub fn discover<S: AsRef<str>>(
    base_dir: impl AsRef<Path>,
    data_dir: impl AsRef<Path>,
    extensions: &[S],
    max_depth_offset: usize,
) -> Vec<String> {
    let root = base_dir.as_ref().join(data_dir);
    discover_files(&root, extensions, max_depth_offset)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Discover the fixtures described by a configuration.
///
/// Names are matched against the `filter` regex, if any, and the result is
/// sorted by name.
pub fn discover_fixtures(config: &HarnessConfig) -> Result<Vec<Fixture>, ConfigError> {
    let filter = config
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| ConfigError::Validation(format!("invalid filter: {}", e)))?;
    let store = GoldenStore::new(&config.base_dir, &config.expected_dir);

    let mut fixtures: Vec<Fixture> =
        discover_files(&config.data_root(), &config.extensions, config.max_depth)
            .into_iter()
            .filter(|(name, _)| match &filter {
                Some(re) => {
                    let keep = re.is_match(name);
                    if !keep {
                        tracing::debug!(fixture = %name, "filtered out");
                    }
                    keep
                }
                None => true,
            })
            .map(|(name, source)| Fixture::new(name, source, &store))
            .collect();
    fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(fixtures)
}

/// Like [`discover`], returning each fixture name with its source path
pub fn discover_files<S: AsRef<str>>(
    root: &Path,
    extensions: &[S],
    max_depth_offset: usize,
) -> Vec<(String, PathBuf)> {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "fixture root is not a directory");
        return Vec::new();
    }

    let extensions: HashSet<&str> = extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .collect();

    // The root is depth 0. Files one level below the deepest allowed
    // directory are still candidates.
    let walker = WalkDir::new(root)
        .max_depth(max_depth_offset.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.depth() > max_depth_offset));

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        // Symlinked files count; symlinked directories are not entered
        if !entry.path().is_file() {
            continue;
        }

        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(ext));
        if !matches {
            continue;
        }

        if let Some(name) = fixture_name(root, path) {
            found.push((name, path.to_path_buf()));
        }
    }

    tracing::debug!(root = %root.display(), count = found.len(), "discovered fixtures");
    found
}

/// Relative, `/`-separated name of a fixture file without its extension
fn fixture_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
