//! Harvest tables: one row per game management unit with counts by sex
//! class, hunter numbers, and success rate.

use herd_knowledge_table::LogicalTable;
use herd_knowledge_table::numeric::{coerce_f64, coerce_i64, parse_unit};
use herd_knowledge_table::schema::SchemaMap;
use herd_knowledge_wildlife_models::{HarvestRecord, RecordContext};

use crate::{NormalizeError, Normalized, SchemaWarning, header, is_footer};

const MEASUREMENT_COLUMNS: &[&str] = &[
    "total_harvest",
    "total_hunters",
    "percent_success",
    "total_rec_days",
];

/// Normalizes a harvest table whose first row is the header.
///
/// Species-specific sex columns (`bulls`/`cows`/`calves` for elk,
/// `bucks`/`does`/`fawns` otherwise) map onto adult male, adult female,
/// and young. Rows without a plain numeric unit are dropped.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingHeader`] if the table has no rows and
/// [`NormalizeError::MissingSeason`] if the context has no season.
pub fn normalize_harvest(
    table: &LogicalTable,
    ctx: &RecordContext,
) -> Result<Normalized<HarvestRecord>, NormalizeError> {
    let season = ctx.season.clone().ok_or(NormalizeError::MissingSeason)?;
    let schema = SchemaMap::from_raw_headers(header(table)?);

    let [male_col, female_col, young_col] = ctx.species.harvest_sex_columns();

    let warnings = ["unit", male_col, female_col, young_col]
        .iter()
        .chain(MEASUREMENT_COLUMNS)
        .filter(|column| !schema.contains(column))
        .map(|column| SchemaWarning::MissingColumn((*column).to_string()))
        .collect();

    let mut out = Normalized::new(warnings);

    for row in table.data_rows() {
        if is_footer(row) {
            out.dropped_footer += 1;
            continue;
        }

        let Some(unit) = schema.field(row, "unit").and_then(parse_unit) else {
            log::debug!("Dropping harvest row without a unit: {row:?}");
            out.dropped_invalid += 1;
            continue;
        };

        let count = |column: &str| schema.field(row, column).and_then(coerce_i64);

        out.records.push(HarvestRecord {
            state: ctx.state,
            species: ctx.species,
            season: season.clone(),
            year: ctx.year,
            unit,
            adult_male: count(male_col),
            adult_female: count(female_col),
            young: count(young_col),
            total_harvest: count("total_harvest"),
            total_hunters: count("total_hunters"),
            percent_success: schema.field(row, "percent_success").and_then(coerce_f64),
            total_rec_days: count("total_rec_days"),
        });
    }

    out.log_summary("harvest", ctx);
    Ok(out)
}
