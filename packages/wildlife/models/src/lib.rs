#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Species, state, and canonical herd record types.
//!
//! Every extraction pipeline (local PDF or remote table detection) ends in
//! one of the two canonical record shapes defined here:
//! [`HerdPopulationRecord`] for post-hunt population estimates and
//! [`HarvestRecord`] for per-unit harvest statistics.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Big-game species tracked by the state agency reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Species {
    /// Rocky Mountain elk
    Elk,
    /// Mule and white-tailed deer
    Deer,
    /// Pronghorn antelope
    Pronghorn,
}

impl Species {
    /// Normalized header names that carry the male:female ratio column
    /// for this species, in preference order.
    ///
    /// The canonical `male_female_ratio` name is accepted for every
    /// species and is always the last candidate.
    #[must_use]
    pub const fn ratio_headers(self) -> &'static [&'static str] {
        match self {
            Self::Elk => &[
                "bull_cow_ratio_per_100",
                "bull_per_cow_ratio_per_100",
                "male_female_ratio",
            ],
            Self::Deer => &[
                "buck_doe_ratio_per_100",
                "buck_per_doe_ratio_per_100",
                "male_female_ratio",
            ],
            Self::Pronghorn => &["buck_per_doe_ratio_per_100", "male_female_ratio"],
        }
    }

    /// Source harvest columns for `(adult male, adult female, young)`.
    #[must_use]
    pub const fn harvest_sex_columns(self) -> [&'static str; 3] {
        match self {
            Self::Elk => ["bulls", "cows", "calves"],
            Self::Deer | Self::Pronghorn => ["bucks", "does", "fawns"],
        }
    }
}

/// Two-letter codes for the western states whose reports are supported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StateCode {
    Ak,
    Az,
    Ca,
    Co,
    Id,
    Mt,
    Nm,
    Nv,
    Or,
    Ut,
    Wa,
    Wy,
}

impl StateCode {
    /// Full snake-case state name used in raw report filenames.
    #[must_use]
    pub const fn full_name(self) -> &'static str {
        match self {
            Self::Ak => "alaska",
            Self::Az => "arizona",
            Self::Ca => "california",
            Self::Co => "colorado",
            Self::Id => "idaho",
            Self::Mt => "montana",
            Self::Nm => "new_mexico",
            Self::Nv => "nevada",
            Self::Or => "oregon",
            Self::Ut => "utah",
            Self::Wa => "washington",
            Self::Wy => "wyoming",
        }
    }
}

/// Which kind of agency report a PDF contains.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportKind {
    /// Post-hunt population and sex-ratio estimates per herd.
    Population,
    /// Harvest statistics per game management unit and season.
    Harvest,
}

/// Context attached to every record extracted from one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContext {
    /// State the report was published by.
    pub state: StateCode,
    /// Species the report covers.
    pub species: Species,
    /// Report year.
    pub year: i32,
    /// Hunting season (`archery`, `rifle`, ...). Harvest reports only.
    pub season: Option<String>,
}

impl RecordContext {
    /// Creates a context without a season.
    #[must_use]
    pub const fn new(state: StateCode, species: Species, year: i32) -> Self {
        Self {
            state,
            species,
            year,
            season: None,
        }
    }

    /// Returns this context with the given season attached.
    #[must_use]
    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }
}

/// Canonical post-hunt population record for one herd.
///
/// `herd_name` is optional because some reports carry neither a herd name
/// nor a DAU column; the loader rejects such records instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerdPopulationRecord {
    /// Data Analysis Unit identifier.
    pub dau: Option<String>,
    /// Herd name, or `DAU_<dau>` when the report has no herd column.
    pub herd_name: Option<String>,
    /// Game management units, comma-joined as printed.
    pub gmu_list: Option<String>,
    /// Post-hunt population estimate.
    pub post_hunt_estimate: Option<i64>,
    /// Males per 100 females.
    pub male_female_ratio: Option<f64>,
    pub state: StateCode,
    pub species: Species,
    pub year: i32,
}

/// Canonical harvest record for one game management unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub state: StateCode,
    pub species: Species,
    pub season: String,
    pub year: i32,
    /// Game management unit number. Rows without one never become records.
    pub unit: i64,
    pub adult_male: Option<i64>,
    pub adult_female: Option<i64>,
    pub young: Option<i64>,
    pub total_harvest: Option<i64>,
    pub total_hunters: Option<i64>,
    pub percent_success: Option<f64>,
    pub total_rec_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn parses_state_codes_case_insensitively() {
        assert_eq!(StateCode::from_str("CO").unwrap(), StateCode::Co);
        assert_eq!(StateCode::from_str("nm").unwrap().full_name(), "new_mexico");
        assert!(StateCode::from_str("tx").is_err());
    }

    #[test]
    fn species_round_trips_through_strings() {
        assert_eq!(Species::from_str("Elk").unwrap(), Species::Elk);
        assert_eq!(Species::Pronghorn.to_string(), "pronghorn");
        assert_eq!(Species::Deer.as_ref(), "deer");
    }

    #[test]
    fn ratio_headers_end_with_canonical_name() {
        use strum::IntoEnumIterator as _;

        for species in Species::iter() {
            assert_eq!(species.ratio_headers().last(), Some(&"male_female_ratio"));
        }
    }

    #[test]
    fn context_with_season() {
        let ctx = RecordContext::new(StateCode::Co, Species::Elk, 2024).with_season("archery");
        assert_eq!(ctx.season.as_deref(), Some("archery"));
    }
}
