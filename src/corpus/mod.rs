//! Corpus discovery
//!
//! A corpus is the set of shards found for one run. Discovery is a flat
//! listing of one directory: subdirectories are not descended into.

pub mod source;

pub use source::{GzipLineSource, LineSource, LineStream};

use crate::error::{CountError, CountResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Default file suffix for shards.
pub const DEFAULT_SHARD_SUFFIX: &str = ".txt.gz";

/// One independently compressed input unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shard {
    /// Opaque location handed to the line source
    pub id: PathBuf,
    /// Log label and output column name
    pub display_name: String,
}

impl Shard {
    pub fn new(id: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Build a shard whose display name is the file's basename.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let id = path.into();
        let display_name = id
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.display().to_string());
        Self { id, display_name }
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// List the regular files directly inside `dir` whose names end with
/// `suffix`, sorted by display name.
pub fn discover_shards(dir: &Path, suffix: &str) -> CountResult<Vec<Shard>> {
    if !dir.is_dir() {
        return Err(CountError::InputNotDirectory {
            dir: dir.to_path_buf(),
        });
    }

    let mut shards = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| CountError::Discovery {
            dir: dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.ends_with(suffix) {
            shards.push(Shard::new(entry.path(), name.into_owned()));
        }
    }

    if shards.is_empty() {
        return Err(CountError::EmptyCorpus {
            dir: dir.to_path_buf(),
            suffix: suffix.to_string(),
        });
    }

    shards.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    debug!("Discovered {} shards in {}", shards.len(), dir.display());
    Ok(shards)
}
