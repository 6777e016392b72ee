#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local PDF table extraction for herd population reports.
//!
//! Some agency reports are simple enough to read without a table-detection
//! service: the population table prints one herd per line, and the whole
//! line lands in a single cell. This crate extracts those tables with
//! pure-Rust text extraction ([`pdf_extract`]) and splits each line into
//! fields with the positional heuristics in [`dau_rows`].
//!
//! Extraction sits behind the [`TableExtractor`] trait so pipelines can be
//! driven by canned tables in tests.

pub mod dau_rows;

use std::path::Path;

/// One extracted table: rows of cells, where a cell may be absent.
pub type RawTable = Vec<Vec<Option<String>>>;

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can pull tables out of a PDF file.
pub trait TableExtractor {
    /// Extracts the tables found in the PDF at `path`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or parsed.
    fn extract_tables(&self, path: &Path) -> Result<Vec<RawTable>, PdfError>;
}

/// Extracts the first page of a PDF as a single one-column table.
///
/// Every non-empty text line becomes a row with one cell, which is the
/// shape the DAU row parser expects.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextTableExtractor;

impl TextTableExtractor {
    /// Splits page text into one-cell rows, dropping blank lines.
    #[must_use]
    pub fn lines_to_table(page_text: &str) -> RawTable {
        page_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| vec![Some(line.to_owned())])
            .collect()
    }
}

impl TableExtractor for TextTableExtractor {
    fn extract_tables(&self, path: &Path) -> Result<Vec<RawTable>, PdfError> {
        let bytes = std::fs::read(path)?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

        let Some(first_page) = pages.first() else {
            log::warn!("{} has no pages", path.display());
            return Ok(Vec::new());
        };

        let table = Self::lines_to_table(first_page);
        log::debug!(
            "Extracted {} text rows from page 1 of {}",
            table.len(),
            path.display()
        );

        if table.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![table])
    }
}
