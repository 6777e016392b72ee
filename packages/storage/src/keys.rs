//! Object key conventions.
//!
//! ```text
//! raw/{state}/{species}/population/{full_state}_{species}_population_{year}.pdf
//! raw/{state}/{species}/harvest/{season}/{full_state}_{season}_{species}_harvest_{year}.pdf
//! processed/{state}/{species}/{kind}/[{season}/]{year}/{filename_base}.parquet
//! ```

use std::sync::LazyLock;

use herd_knowledge_wildlife_models::{ReportKind, Species, StateCode};
use regex::Regex;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid regex"));

fn kind_prefix(
    root: &str,
    state: StateCode,
    species: Species,
    kind: ReportKind,
    season: Option<&str>,
) -> String {
    match season {
        Some(season) => format!("{root}/{state}/{species}/{kind}/{season}/"),
        None => format!("{root}/{state}/{species}/{kind}/"),
    }
}

/// Prefix under which raw PDFs of one report series are stored.
#[must_use]
pub fn raw_prefix(
    state: StateCode,
    species: Species,
    kind: ReportKind,
    season: Option<&str>,
) -> String {
    kind_prefix("raw", state, species, kind, season)
}

/// Conventional raw PDF file name for a report.
#[must_use]
pub fn raw_filename(
    state: StateCode,
    species: Species,
    kind: ReportKind,
    season: Option<&str>,
    year: i32,
) -> String {
    let full_state = state.full_name();
    match season {
        Some(season) => format!("{full_state}_{season}_{species}_{kind}_{year}.pdf"),
        None => format!("{full_state}_{species}_{kind}_{year}.pdf"),
    }
}

/// Conventional raw PDF key for a report.
#[must_use]
pub fn raw_key(
    state: StateCode,
    species: Species,
    kind: ReportKind,
    season: Option<&str>,
    year: i32,
) -> String {
    format!(
        "{}{}",
        raw_prefix(state, species, kind, season),
        raw_filename(state, species, kind, season, year)
    )
}

/// Key of the processed parquet file derived from a raw PDF.
#[must_use]
pub fn processed_key(
    state: StateCode,
    species: Species,
    kind: ReportKind,
    season: Option<&str>,
    year: i32,
    filename_base: &str,
) -> String {
    format!(
        "{}{year}/{filename_base}.parquet",
        kind_prefix("processed", state, species, kind, season)
    )
}

/// File name of a key without its directory or extension.
#[must_use]
pub fn filename_base(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Report year taken from the first run of four digits in the key's file
/// name.
#[must_use]
pub fn year_from_key(key: &str) -> Option<i32> {
    let name = key.rsplit('/').next().unwrap_or(key);
    YEAR_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns `true` for processed population parquet keys.
#[must_use]
pub fn is_processed_population_key(key: &str) -> bool {
    key.starts_with("processed/")
        && key.contains("/population/")
        && key.ends_with(".parquet")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_keys() {
        assert_eq!(
            raw_key(StateCode::Co, Species::Elk, ReportKind::Population, None, 2023),
            "raw/co/elk/population/colorado_elk_population_2023.pdf"
        );
        assert_eq!(
            processed_key(
                StateCode::Co,
                Species::Elk,
                ReportKind::Population,
                None,
                2023,
                "colorado_elk_population_2023"
            ),
            "processed/co/elk/population/2023/colorado_elk_population_2023.parquet"
        );
    }

    #[test]
    fn harvest_keys_include_season() {
        assert_eq!(
            raw_key(
                StateCode::Nm,
                Species::Deer,
                ReportKind::Harvest,
                Some("archery"),
                2024
            ),
            "raw/nm/deer/harvest/archery/new_mexico_archery_deer_harvest_2024.pdf"
        );
        assert_eq!(
            raw_prefix(StateCode::Co, Species::Elk, ReportKind::Harvest, Some("rifle")),
            "raw/co/elk/harvest/rifle/"
        );
        assert_eq!(
            processed_key(
                StateCode::Co,
                Species::Elk,
                ReportKind::Harvest,
                Some("rifle"),
                2022,
                "x"
            ),
            "processed/co/elk/harvest/rifle/2022/x.parquet"
        );
    }

    #[test]
    fn filename_base_strips_directory_and_extension() {
        assert_eq!(
            filename_base("raw/co/elk/population/colorado_elk_population_2023.pdf"),
            "colorado_elk_population_2023"
        );
        assert_eq!(filename_base("plain"), "plain");
        assert_eq!(filename_base("dir/.hidden"), ".hidden");
    }

    #[test]
    fn year_comes_from_file_name() {
        assert_eq!(
            year_from_key("raw/co/elk/population/colorado_elk_population_2019.pdf"),
            Some(2019)
        );
        assert_eq!(year_from_key("raw/co/elk/population/elk_summary.pdf"), None);
        assert_eq!(year_from_key("raw/co/elk/population/report_20215.pdf"), Some(2021));
    }

    #[test]
    fn recognizes_processed_population_keys() {
        assert!(is_processed_population_key(
            "processed/co/elk/population/2023/a.parquet"
        ));
        assert!(!is_processed_population_key(
            "processed/co/elk/harvest/rifle/2023/a.parquet"
        ));
        assert!(!is_processed_population_key("raw/co/elk/population/a.pdf"));
    }
}
