#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion pipelines for herd population and harvest reports.
//!
//! Two pipelines turn agency PDFs into canonical records:
//!
//! - [`local::ingest_local_population`] reads a PDF from disk, splits its
//!   one-column table into DAU rows, writes a parquet file, and upserts the
//!   records into `DuckDB`.
//! - [`remote::process_remote`] runs table detection on a PDF in object
//!   storage, rebuilds the cell grid, normalizes it, and uploads a parquet
//!   file next to the raw report.
//!
//! [`batch::run_batch`] drives the remote pipeline over every report of a
//! series that has not been processed yet, and [`audit::audit_stale_population`]
//! finds processed population files written before the ratio column
//! existed.

pub mod audit;
pub mod batch;
pub mod local;
pub mod remote;

#[cfg(test)]
pub(crate) mod fakes;

use std::path::PathBuf;

pub use audit::audit_stale_population;
pub use batch::{BatchRequest, BatchSummary, run_batch};
pub use local::ingest_local_population;
pub use remote::{RemoteDeps, RemoteJob, process_remote};

/// Errors that stop an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Database or parquet error.
    #[error(transparent)]
    Db(#[from] herd_knowledge_database::DbError),

    /// Object storage error.
    #[error(transparent)]
    Storage(#[from] herd_knowledge_storage::StorageError),

    /// Table-detection service error.
    #[error(transparent)]
    Textract(#[from] herd_knowledge_textract::TextractError),

    /// The table could not be normalized at all.
    #[error(transparent)]
    Normalize(#[from] herd_knowledge_normalize::NormalizeError),

    /// Local PDF extraction error.
    #[error(transparent)]
    Pdf(#[from] herd_knowledge_pdf::PdfError),

    /// I/O error on a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table-detection job finished in a failed state.
    #[error("Table analysis job {job_id} failed for {key}")]
    JobFailed {
        /// Object key of the report.
        key: String,
        /// Id of the failed job.
        job_id: String,
    },
}

/// Why a report produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// The input PDF does not exist.
    MissingFile(PathBuf),
    /// No table was found in the PDF.
    NoTable,
    /// The table has a header but no data rows.
    NoRows,
    /// Table detection returned no positioned cells.
    EmptyGrid,
    /// Every row was dropped during parsing or normalization.
    NoRecords,
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile(path) => write!(f, "file not found: {}", path.display()),
            Self::NoTable => f.write_str("no table found"),
            Self::NoRows => f.write_str("table has no data rows"),
            Self::EmptyGrid => f.write_str("no table cells detected"),
            Self::NoRecords => f.write_str("no records survived normalization"),
        }
    }
}

/// Result of running one report through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Records were written.
    Processed {
        /// Number of records written.
        records: usize,
        /// Local path or object key of the parquet output.
        output: String,
    },
    /// Nothing was written.
    Skipped(Skip),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reasons_read_as_sentences() {
        assert_eq!(
            Skip::MissingFile(PathBuf::from("/tmp/x.pdf")).to_string(),
            "file not found: /tmp/x.pdf"
        );
        assert_eq!(Skip::EmptyGrid.to_string(), "no table cells detected");
    }

    #[test]
    fn job_failure_names_key_and_job() {
        let err = IngestError::JobFailed {
            key: "raw/co/elk/population/a.pdf".to_string(),
            job_id: "job-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Table analysis job job-1 failed for raw/co/elk/population/a.pdf"
        );
    }
}
