//! Column lookup by normalized header name.
//!
//! A [`SchemaMap`] is built once from a table's header row and answers
//! "which column holds field X, if any" for every data row. Transform code
//! asks for optional fields through it instead of testing header
//! membership ad hoc.

use std::collections::BTreeMap;

use crate::headers::normalize_headers;

/// Mapping from normalized header name to column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMap {
    columns: BTreeMap<String, usize>,
    headers: Vec<String>,
}

impl SchemaMap {
    /// Builds a schema from a raw header row.
    ///
    /// When two columns normalize to the same name, the leftmost one wins
    /// and the duplicate is logged.
    #[must_use]
    pub fn from_raw_headers(raw: &[String]) -> Self {
        let headers = normalize_headers(raw);
        let mut columns = BTreeMap::new();

        for (idx, name) in headers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if columns.contains_key(name) {
                log::warn!("Duplicate column {name:?} at index {idx}; keeping the first");
                continue;
            }
            columns.insert(name.clone(), idx);
        }

        Self { columns, headers }
    }

    /// Normalized headers in column order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns `true` if a column with this normalized name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column index of a field.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Returns the first of `candidates` that is present in the schema.
    #[must_use]
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.contains(c))
    }

    /// Returns the text of field `name` in `row`, if the column exists.
    #[must_use]
    pub fn field<'r>(&self, row: &'r [String], name: &str) -> Option<&'r str> {
        self.index_of(name)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn looks_up_fields_by_canonical_name() {
        let schema = SchemaMap::from_raw_headers(&strings(&["DAU*", "Herd Name", "GMU"]));
        let row = strings(&["12", "South Park", "76,77"]);

        assert_eq!(schema.field(&row, "dau"), Some("12"));
        assert_eq!(schema.field(&row, "herd_name"), Some("South Park"));
        assert_eq!(schema.field(&row, "gmu_list"), Some("76,77"));
        assert_eq!(schema.field(&row, "unit"), None);
    }

    #[test]
    fn first_present_respects_candidate_order() {
        let schema = SchemaMap::from_raw_headers(&strings(&[
            "male_female_ratio",
            "Bull/Cow Ratio (per 100)",
        ]));
        assert_eq!(
            schema.first_present(&["bull_per_cow_ratio_per_100", "male_female_ratio"]),
            Some("bull_per_cow_ratio_per_100")
        );
        assert_eq!(schema.first_present(&["buck_doe_ratio_per_100"]), None);
    }

    #[test]
    fn duplicate_headers_keep_leftmost_column() {
        let schema = SchemaMap::from_raw_headers(&strings(&["Unit", "UNIT"]));
        assert_eq!(schema.index_of("unit"), Some(0));
    }

    #[test]
    fn short_rows_yield_none() {
        let schema = SchemaMap::from_raw_headers(&strings(&["a", "b"]));
        assert_eq!(schema.field(&strings(&["1"]), "b"), None);
    }
}
