#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Logical table model shared by every extraction path.
//!
//! Both the local PDF extractor and the remote table-detection service end
//! up producing a [`LogicalTable`]: a rectangular grid of strings whose
//! first row is the header. This crate owns that type plus the pieces that
//! operate on it before records exist:
//!
//! - [`grid`]: rebuilding a table from positioned cell fragments
//! - [`headers`]: canonicalizing header spellings across report vintages
//! - [`numeric`]: total (never failing) numeric coercion of cell text
//! - [`schema`]: optional-field lookup by normalized header name

pub mod grid;
pub mod headers;
pub mod numeric;
pub mod schema;

use serde::{Deserialize, Serialize};

/// Errors produced while building a [`LogicalTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The input contained no table cells at all.
    #[error("empty table: no cells to reconstruct")]
    Empty,
}

/// A rectangular table of cell text.
///
/// Every row has exactly [`LogicalTable::width`] entries; cells that were
/// never observed are empty strings. Row 0 is the header row by
/// convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTable {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl LogicalTable {
    /// Builds a table from possibly ragged rows, padding short rows with
    /// empty strings so the result is rectangular.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { rows, width }
    }

    /// Builds a table from extractor output where absent cells are `None`.
    #[must_use]
    pub fn from_optional_rows(rows: Vec<Vec<Option<String>>>) -> Self {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
                .collect(),
        )
    }

    /// Number of columns in every row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows, header included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, header included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row, if the table has any rows.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Rows after the header.
    #[must_use]
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }
}
