#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the local data directory.
//!
//! Everything the pipelines write locally lives under one data directory
//! (`data/` in the project root by default). Object keys such as
//! `processed/co/elk/population/2023/colorado_elk_population_2023.parquet`
//! map onto it unchanged, so local and remote layouts match.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`; falls back to the
/// current directory if the crate is not nested two levels deep.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the default `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default database file, `data/database/herd_data.duckdb`.
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_dir().join("database").join("herd_data.duckdb")
}

/// Returns the directory holding SQL scripts of one kind (`create` or
/// `load`).
#[must_use]
pub fn sql_dir(kind: &str) -> PathBuf {
    project_root().join("sql").join(kind)
}

/// Locations under a chosen data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new(data_dir())
    }
}

impl DataPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch space for downloads and files awaiting upload.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Local directory mirroring the `processed/` object prefix.
    #[must_use]
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Local path for an object-storage style key.
    #[must_use]
    pub fn local_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
