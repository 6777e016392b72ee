#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for herd population and harvest records.
//!
//! Records land in one table per species and report kind
//! (`elk_population`, `deer_harvest`, ...), keyed by a composite natural
//! key and written with multi-row `INSERT ... ON CONFLICT DO UPDATE`.
//! Parquet files are written and read through `DuckDB` as well, so the
//! columnar format never needs a separate library.

pub mod loader;
pub mod parquet;
pub mod paths;
pub mod rows;
pub mod scripts;
pub mod store;

use std::path::Path;

use duckdb::Connection;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record is missing a field that is part of its table's key.
    #[error("Record {index} for {table} has no {field}")]
    MissingKey {
        /// Destination table.
        table: String,
        /// Key column that was null.
        field: &'static str,
        /// Position of the record in the input batch.
        index: usize,
    },
}

/// Opens (or creates) the database file, creating parent directories.
///
/// # Errors
///
/// Returns [`DbError`] if the directory or connection cannot be created.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    log::debug!("Opened database {}", path.display());

    Ok(conn)
}

/// Quotes a string as a SQL literal.
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
