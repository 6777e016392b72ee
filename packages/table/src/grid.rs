//! Cell grid reconstruction from positioned table fragments.
//!
//! Table-detection services return a flat, unordered list of blocks. Word
//! blocks carry text; cell blocks carry a 1-based `(row, column)` position
//! on a page and reference their words by id. Reconstruction stitches the
//! cells of every page into one continuous [`LogicalTable`], shifting each
//! page's rows down by the highest row index seen on the pages before it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LogicalTable, TableError};

/// Kind of a detected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    /// A single recognized word with text.
    Word,
    /// A table cell positioned by row/column index.
    Cell,
    /// Pages, lines, tables, and anything else the grid does not use.
    Other,
}

/// One block returned by the table-detection service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub block_type: BlockType,
    /// 1-based page number. Blocks without one are treated as page 1.
    pub page: u32,
    /// 1-based row index (cells only).
    pub row_index: Option<u32>,
    /// 1-based column index (cells only).
    pub column_index: Option<u32>,
    /// Recognized text (words only).
    pub text: Option<String>,
    /// Ids of child blocks, in reading order.
    pub child_ids: Vec<String>,
}

impl Block {
    /// Creates a word block.
    #[must_use]
    pub fn word(id: &str, page: u32, text: &str) -> Self {
        Self {
            id: id.to_string(),
            block_type: BlockType::Word,
            page,
            row_index: None,
            column_index: None,
            text: Some(text.to_string()),
            child_ids: Vec::new(),
        }
    }

    /// Creates a cell block referencing the given word ids.
    #[must_use]
    pub fn cell(id: &str, page: u32, row: u32, column: u32, child_ids: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            block_type: BlockType::Cell,
            page,
            row_index: Some(row),
            column_index: Some(column),
            text: None,
            child_ids: child_ids.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// Rebuilds a rectangular table from word and cell blocks.
///
/// Cell text is the cell's child words joined by single spaces; child ids
/// with no matching word contribute an empty string. Row indices from
/// later pages are offset by the cumulative maximum row index of the
/// earlier pages, so multi-page tables are concatenated in page order.
/// Cells with column index 0, or whose offset row would overflow, are
/// logged and dropped.
///
/// # Errors
///
/// Returns [`TableError::Empty`] if there are no positioned cells.
pub fn reconstruct(blocks: &[Block]) -> Result<LogicalTable, TableError> {
    let words: BTreeMap<&str, &str> = blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Word)
        .map(|b| (b.id.as_str(), b.text.as_deref().unwrap_or_default()))
        .collect();

    let mut pages: BTreeMap<u32, Vec<(u32, u32, &Block)>> = BTreeMap::new();
    for block in blocks.iter().filter(|b| b.block_type == BlockType::Cell) {
        let (Some(row), Some(col)) = (block.row_index, block.column_index) else {
            log::debug!("Cell block {} has no row/column index, skipping", block.id);
            continue;
        };
        if col == 0 {
            log::warn!("Cell block {} has column index 0, skipping", block.id);
            continue;
        }
        pages.entry(block.page).or_default().push((row, col, block));
    }

    let mut grid: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
    let mut row_offset = 0u32;

    for (page, cells) in &pages {
        let max_row = cells.iter().map(|(row, _, _)| *row).max().unwrap_or(0);

        for (row, col, cell) in cells {
            let text = cell
                .child_ids
                .iter()
                .map(|id| words.get(id.as_str()).copied().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ");
            let Some(grid_row) = row.checked_add(row_offset) else {
                log::warn!(
                    "Cell block {} on page {page}: row {row} past offset {row_offset} overflows, skipping",
                    cell.id
                );
                continue;
            };
            grid.entry(grid_row).or_default().insert(*col, text);
        }

        log::debug!(
            "Page {page}: {} cells, max row {max_row}, row offset {row_offset}",
            cells.len()
        );
        row_offset = row_offset.saturating_add(max_row);
    }

    let Some(max_col) = grid.values().flat_map(BTreeMap::keys).copied().max() else {
        return Err(TableError::Empty);
    };

    let rows = grid
        .values()
        .map(|cols| {
            (1..=max_col)
                .map(|c| cols.get(&c).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(LogicalTable::from_rows(rows))
}
