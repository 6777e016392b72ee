//! Positional parsing of single-line DAU rows.
//!
//! Locally extracted population tables arrive as one text line per herd:
//!
//! ```text
//! 12 South Park 76,77,78 1,250 18
//! ^^ ^^^^^^^^^^ ^^^^^^^^ ^^^^^ ^^
//! DAU herd name GMU list est.  ratio
//! ```
//!
//! There is no delimiter between the herd name and the GMU list, so the
//! split is heuristic: the first token that starts with a digit or
//! contains a comma opens the GMU region. Herd names with embedded digits
//! ("Unit 12 Herd") are mis-split; that is a known limitation.

use std::sync::LazyLock;

use herd_knowledge_table::LogicalTable;
use regex::Regex;

/// Leading two-digit DAU identifier.
static DAU_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})").expect("valid regex"));

/// Substrings that mark header, footnote, and total rows.
const MARKERS: &[&str] = &["Total", "DAU (", "* DAU"];

/// Fewest tokens after the DAU: name, GMU, estimate, ratio.
const MIN_TOKENS: usize = 4;

/// Fields of one parsed DAU row, still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DauRow {
    pub dau: String,
    pub herd_name: String,
    pub gmu_list: String,
    pub estimate: String,
    pub ratio: String,
}

/// Why a row was not parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A header, footnote, or total row.
    Marker,
    /// The row does not start with a two-digit DAU.
    NoDau,
    /// Fewer than four tokens followed the DAU.
    TooFewTokens(usize),
    /// The GMU region starts right after the DAU, leaving no herd name.
    NoHerdName,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marker => f.write_str("header/footer marker"),
            Self::NoDau => f.write_str("no leading two-digit DAU"),
            Self::TooFewTokens(n) => write!(f, "insufficient parts ({n} < {MIN_TOKENS})"),
            Self::NoHerdName => f.write_str("no herd name before the GMU list"),
        }
    }
}

/// A row that was skipped, with its text and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub text: String,
    pub reason: SkipReason,
}

/// Result of parsing every data row of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DauParse {
    pub rows: Vec<DauRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Returns `true` if a token opens the GMU region.
fn starts_gmu_region(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit()) || token.contains(',')
}

/// Parses one row of text into DAU fields.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the row is a marker row, lacks a DAU,
/// or has too few tokens.
pub fn parse_dau_row(text: &str) -> Result<DauRow, SkipReason> {
    let text = text.trim();

    if MARKERS.iter().any(|m| text.contains(m)) {
        return Err(SkipReason::Marker);
    }

    let dau = DAU_PREFIX_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or(SkipReason::NoDau)?;

    let tokens: Vec<&str> = text[dau.len()..].split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return Err(SkipReason::TooFewTokens(tokens.len()));
    }

    let (name_and_gmu, tail) = tokens.split_at(tokens.len() - 2);
    let estimate = tail[0].to_owned();
    let ratio = tail[1].to_owned();

    let gmu_start = name_and_gmu
        .iter()
        .position(|t| starts_gmu_region(t))
        .unwrap_or(name_and_gmu.len() - 1);

    let (name_parts, gmu_parts) = name_and_gmu.split_at(gmu_start);
    if name_parts.is_empty() {
        return Err(SkipReason::NoHerdName);
    }

    Ok(DauRow {
        dau,
        herd_name: name_parts.join(" "),
        gmu_list: gmu_parts.concat(),
        estimate,
        ratio,
    })
}

/// Parses the data rows (everything after the header) of a one-column
/// table, collecting skipped rows instead of failing.
#[must_use]
pub fn parse_dau_table(table: &LogicalTable) -> DauParse {
    let mut parse = DauParse::default();

    for row in table.data_rows() {
        let text = row.first().map_or("", |c| c.trim());

        match parse_dau_row(text) {
            Ok(parsed) => parse.rows.push(parsed),
            Err(reason) => {
                if reason == SkipReason::Marker {
                    log::debug!("Skipping marker row: {text:?}");
                } else {
                    log::warn!("Could not parse row ({reason}): {text:?}");
                }
                parse.skipped.push(SkippedRow {
                    text: text.to_owned(),
                    reason,
                });
            }
        }
    }

    log::info!(
        "Parsed {} DAU rows ({} skipped)",
        parse.rows.len(),
        parse.skipped.len()
    );

    parse
}
