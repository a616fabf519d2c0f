#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! JSON level storage keyed by level name.
//!
//! Each level lives at `<root>/<name>.json` and stores its `width`, `height`
//! and a row-major `tiles` matrix. Loading never touches the caller's grid;
//! failures come back as [`LevelStoreError`] and the caller decides what to
//! keep.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use caveslave_core::{LevelData, LevelError};
use caveslave_world::Grid;
use thiserror::Error;

/// Directory used when no explicit level directory is configured.
pub const DEFAULT_LEVELS_DIR: &str = "levels";

const LEVEL_EXTENSION: &str = "json";

/// Errors raised while saving or loading levels.
#[derive(Debug, Error)]
pub enum LevelStoreError {
    /// The provided level name was empty after trimming.
    #[error("level name must not be empty")]
    EmptyName,
    /// The provided level name would escape the level directory.
    #[error("level name `{0}` must not contain path separators")]
    InvalidName(String),
    /// Reading or writing the level file failed.
    #[error("failed to access level file {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The level file is not valid level JSON.
    #[error("failed to parse level file {path}: {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The level could not be encoded as JSON.
    #[error("failed to encode level for {path}: {source}")]
    Encode {
        /// File being written.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The level parsed but its matrix does not match its dimensions.
    #[error("level file {path} is malformed: {source}")]
    Invalid {
        /// File being validated.
        path: PathBuf,
        /// Shape mismatch.
        #[source]
        source: LevelError,
    },
}

/// Filesystem-backed level storage.
#[derive(Clone, Debug)]
pub struct LevelStore {
    root: PathBuf,
}

impl LevelStore {
    /// Creates a store rooted at the provided directory.
    ///
    /// The directory is created lazily on the first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the level files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the file backing the named level.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, LevelStoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LevelStoreError::EmptyName);
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(LevelStoreError::InvalidName(name.to_owned()));
        }

        Ok(self.root.join(format!("{name}.{LEVEL_EXTENSION}")))
    }

    /// Writes the grid under the provided name, replacing any previous level.
    pub fn save(&self, name: &str, grid: &Grid) -> Result<PathBuf, LevelStoreError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root).map_err(|source| LevelStoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(&grid.to_level()).map_err(|source| {
            LevelStoreError::Encode {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| LevelStoreError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("saved level to {}", path.display());
        Ok(path)
    }

    /// Reads and validates the named level.
    pub fn load(&self, name: &str) -> Result<LevelData, LevelStoreError> {
        let path = self.path_for(name)?;
        let contents = fs::read_to_string(&path).map_err(|source| LevelStoreError::Io {
            path: path.clone(),
            source,
        })?;
        let level: LevelData =
            serde_json::from_str(&contents).map_err(|source| LevelStoreError::Parse {
                path: path.clone(),
                source,
            })?;
        level
            .validate()
            .map_err(|source| LevelStoreError::Invalid { path, source })?;

        Ok(level)
    }
}

impl Default for LevelStore {
    fn default() -> Self {
        Self::new(DEFAULT_LEVELS_DIR)
    }
}
