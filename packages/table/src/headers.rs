//! Header canonicalization.
//!
//! Agency reports have renamed, re-punctuated, and occasionally misspelled
//! their column headers from year to year. [`normalize_header`] folds every
//! known spelling onto one canonical snake-case name so record building can
//! look columns up by a single name.
//!
//! Normalization is idempotent: canonical names are fixed points of
//! [`normalize_header`].

use std::sync::LazyLock;

use regex::Regex;

/// Ordered synonym table: the first pattern that matches the cleaned
/// header wins and the header is replaced by the expansion template.
///
/// Patterns are anchored at both ends so the template always replaces the
/// whole header.
static HEADER_SYNONYMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // "Game Management Units Involved in 2019" and the 2021 typo
        // "Game Management Unites Involved in 2021".
        (r"^game_management_unite?s_involved_in_\d{4}.*$", "gmu_list"),
        (r"^(gmus?|gmu_list)$", "gmu_list"),
        (r"^dau(s|_no|_number)?$", "dau"),
        (r"^herd(_name)?$", "herd_name"),
        (
            r"^post_?hunt_(pop(ulation)?_)?est(imate)?s?$",
            "post_hunt_estimate",
        ),
        (r"^(bull|buck)_?(cow|doe)_ratio(_per_100)?$", "${1}_${2}_ratio_per_100"),
        (r"^unit(_no|_number)?$", "unit"),
        (r"^total_harvest(ed)?$", "total_harvest"),
        (r"^(total_)?hunters$", "total_hunters"),
        (r"^(percent|pct)?_?success$", "percent_success"),
        (r"^total_(rec(reation)?_)?days$", "total_rec_days"),
    ]
    .into_iter()
    .map(|(pattern, template)| (Regex::new(pattern).expect("valid regex"), template))
    .collect()
});

/// Applies the mechanical clean-up to a raw header without resolving
/// synonyms.
///
/// Trims, lowercases, turns whitespace into `_` and `/` into `_per_`, then
/// drops everything outside `[a-z0-9_]`.
#[must_use]
pub fn clean_header(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.trim().to_lowercase().chars() {
        match ch {
            '/' => cleaned.push_str("_per_"),
            c if c.is_whitespace() => cleaned.push('_'),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' => cleaned.push(c),
            _ => {}
        }
    }
    cleaned
}

/// Cleans a raw header and resolves it to its canonical name.
///
/// Headers that match no known synonym are returned in cleaned form.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let cleaned = clean_header(raw);

    for (pattern, template) in HEADER_SYNONYMS.iter() {
        if pattern.is_match(&cleaned) {
            let canonical = pattern.replace(&cleaned, *template).into_owned();
            if canonical != cleaned {
                log::debug!("Header {raw:?} resolved to {canonical:?}");
            }
            return canonical;
        }
    }

    cleaned
}

/// Normalizes every header of a header row.
#[must_use]
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    raw.iter().map(|h| normalize_header(h)).collect()
}
