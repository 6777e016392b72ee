#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record normalization for extracted report tables.
//!
//! Takes a [`LogicalTable`] (header row plus data rows) and the report's
//! [`RecordContext`] and produces canonical records. Missing optional
//! columns never fail a table: the dependent field becomes `None` and a
//! [`SchemaWarning`] is recorded. Rows are only dropped for three reasons,
//! each counted in the result:
//!
//! - footer rows whose first cell is `total`
//! - harvest rows without a valid unit number
//! - population rows whose sex ratio is exactly zero (empty placeholders)

pub mod harvest;
pub mod population;

use herd_knowledge_table::LogicalTable;
use herd_knowledge_wildlife_models::RecordContext;

pub use harvest::normalize_harvest;
pub use population::{normalize_dau_rows, normalize_population};

/// Errors that stop a whole table from being normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The table has no rows at all, so there is no header to read.
    #[error("table has no header row")]
    MissingHeader,

    /// A harvest table was normalized without a season in its context.
    #[error("harvest records require a season")]
    MissingSeason,
}

/// A column the normalizer looked for and did not find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    /// None of the sex-ratio header synonyms were present.
    MissingRatio {
        /// Normalized names that were tried.
        candidates: Vec<String>,
    },
    /// Neither a herd name nor a DAU column was present.
    MissingHerdName,
    /// An expected column was absent; its field is `None` on every record.
    MissingColumn(String),
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRatio { candidates } => {
                write!(f, "no sex ratio column (tried {})", candidates.join(", "))
            }
            Self::MissingHerdName => f.write_str("no herd_name or dau column"),
            Self::MissingColumn(name) => write!(f, "missing column {name:?}"),
        }
    }
}

/// Normalized records plus an account of everything that was dropped or
/// missing.
///
/// For any input, `records.len() + dropped_footer + dropped_invalid`
/// equals the number of data rows in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub warnings: Vec<SchemaWarning>,
    /// Footer (`total`) rows removed.
    pub dropped_footer: usize,
    /// Rows removed for an invalid unit or a zero ratio.
    pub dropped_invalid: usize,
}

impl<T> Normalized<T> {
    const fn new(warnings: Vec<SchemaWarning>) -> Self {
        Self {
            records: Vec::new(),
            warnings,
            dropped_footer: 0,
            dropped_invalid: 0,
        }
    }

    fn log_summary(&self, kind: &str, ctx: &RecordContext) {
        for warning in &self.warnings {
            log::warn!(
                "{} {} {kind} {}: {warning}",
                ctx.state,
                ctx.species,
                ctx.year
            );
        }
        log::info!(
            "Normalized {} {kind} records ({} footer rows, {} invalid rows dropped)",
            self.records.len(),
            self.dropped_footer,
            self.dropped_invalid
        );
    }
}

/// Returns `true` for summary rows whose first cell is `total`.
fn is_footer(row: &[String]) -> bool {
    row.first()
        .is_some_and(|cell| cell.trim().eq_ignore_ascii_case("total"))
}

/// Trimmed, non-empty text or `None`.
fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn header(table: &LogicalTable) -> Result<&[String], NormalizeError> {
    table.header().ok_or(NormalizeError::MissingHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_matching_is_trimmed_and_case_insensitive() {
        assert!(is_footer(&["  TOTAL ".to_string(), "5".to_string()]));
        assert!(is_footer(&["Total".to_string()]));
        assert!(!is_footer(&["Totals".to_string()]));
        assert!(!is_footer(&[]));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" 12 ")), Some("12".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
