//! Bulk loading of processed parquet directories.

use std::path::{Path, PathBuf};

use duckdb::Connection;
use herd_knowledge_wildlife_models::{HerdPopulationRecord, Species};

use crate::DbError;
use crate::parquet::read_population_parquet;
use crate::store::{rebuild_population_table, upsert_population};

/// How the destination table is treated before loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Merge into the existing table.
    Upsert,
    /// Drop and recreate the table first.
    Rebuild,
}

/// Outcome of loading a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Files read successfully.
    pub files_read: usize,
    /// Files that could not be read, with the error.
    pub files_failed: Vec<(PathBuf, String)>,
    /// Records skipped because they belong to another species.
    pub other_species: usize,
    /// Rows written to the table.
    pub rows_loaded: u64,
}

/// Recursively collects `*.parquet` files under `dir`, sorted by path.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read.
pub fn collect_parquet_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "parquet") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Loads every population parquet file under `dir` into the species'
/// population table.
///
/// Unreadable files are logged and reported, not fatal. All records are
/// concatenated and written in one upsert, so a record missing its herd
/// name fails the whole load before any row is written.
///
/// # Errors
///
/// Returns [`DbError`] if the directory cannot be listed or the upsert
/// fails.
pub fn load_population_dir(
    conn: &Connection,
    dir: &Path,
    species: Species,
    mode: LoadMode,
) -> Result<LoadReport, DbError> {
    let files = collect_parquet_files(dir)?;
    log::info!("Found {} parquet files under {}", files.len(), dir.display());

    let mut report = LoadReport::default();
    let mut records: Vec<HerdPopulationRecord> = Vec::new();

    for file in files {
        match read_population_parquet(&file) {
            Ok(file_records) => {
                report.files_read += 1;
                for record in file_records {
                    if record.species == species {
                        records.push(record);
                    } else {
                        report.other_species += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", file.display());
                report.files_failed.push((file, e.to_string()));
            }
        }
    }

    if report.other_species > 0 {
        log::warn!(
            "Ignored {} records for species other than {species}",
            report.other_species
        );
    }

    if mode == LoadMode::Rebuild {
        rebuild_population_table(conn, species)?;
    }

    if records.is_empty() {
        log::warn!("No {species} population records found under {}", dir.display());
        return Ok(report);
    }

    report.rows_loaded = upsert_population(conn, &records)?;
    log::info!(
        "Loaded {} rows from {} files",
        report.rows_loaded,
        report.files_read
    );

    Ok(report)
}
