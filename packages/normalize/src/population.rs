//! Population tables: one row per herd with a post-hunt estimate and a
//! male:female ratio.

use herd_knowledge_pdf::dau_rows::DauRow;
use herd_knowledge_table::LogicalTable;
use herd_knowledge_table::numeric::{coerce_f64, coerce_i64};
use herd_knowledge_table::schema::SchemaMap;
use herd_knowledge_wildlife_models::{HerdPopulationRecord, RecordContext};

use crate::{NormalizeError, Normalized, SchemaWarning, header, is_footer, non_empty};

/// Zero ratios mark placeholder rows for herds with no survey.
fn is_placeholder(ratio: Option<f64>) -> bool {
    ratio.is_some_and(|r| r == 0.0)
}

/// Normalizes a population table whose first row is the header.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingHeader`] if the table has no rows.
pub fn normalize_population(
    table: &LogicalTable,
    ctx: &RecordContext,
) -> Result<Normalized<HerdPopulationRecord>, NormalizeError> {
    let schema = SchemaMap::from_raw_headers(header(table)?);
    let mut warnings = Vec::new();

    let ratio_column = schema.first_present(ctx.species.ratio_headers());
    if ratio_column.is_none() {
        warnings.push(SchemaWarning::MissingRatio {
            candidates: ctx
                .species
                .ratio_headers()
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        });
    }

    let has_herd_name = schema.contains("herd_name");
    let has_dau = schema.contains("dau");
    if !has_herd_name && !has_dau {
        warnings.push(SchemaWarning::MissingHerdName);
    }

    for column in ["gmu_list", "post_hunt_estimate"] {
        if !schema.contains(column) {
            warnings.push(SchemaWarning::MissingColumn(column.to_string()));
        }
    }

    let mut out = Normalized::new(warnings);

    for row in table.data_rows() {
        if is_footer(row) {
            out.dropped_footer += 1;
            continue;
        }

        let male_female_ratio =
            ratio_column.and_then(|c| schema.field(row, c).and_then(coerce_f64));
        if is_placeholder(male_female_ratio) {
            out.dropped_invalid += 1;
            continue;
        }

        let dau = non_empty(schema.field(row, "dau"));
        let herd_name = if has_herd_name {
            non_empty(schema.field(row, "herd_name"))
        } else {
            dau.as_ref().map(|d| format!("DAU_{d}"))
        };

        out.records.push(HerdPopulationRecord {
            dau,
            herd_name,
            gmu_list: non_empty(schema.field(row, "gmu_list")),
            post_hunt_estimate: schema.field(row, "post_hunt_estimate").and_then(coerce_i64),
            male_female_ratio,
            state: ctx.state,
            species: ctx.species,
            year: ctx.year,
        });
    }

    out.log_summary("population", ctx);
    Ok(out)
}

/// Normalizes rows produced by the DAU row parser.
///
/// These rows always carry every field, so no schema warnings arise; only
/// zero-ratio placeholders are dropped.
#[must_use]
pub fn normalize_dau_rows(
    rows: &[DauRow],
    ctx: &RecordContext,
) -> Normalized<HerdPopulationRecord> {
    let mut out = Normalized::new(Vec::new());

    for row in rows {
        let male_female_ratio = coerce_f64(&row.ratio);
        if is_placeholder(male_female_ratio) {
            out.dropped_invalid += 1;
            continue;
        }

        out.records.push(HerdPopulationRecord {
            dau: non_empty(Some(row.dau.as_str())),
            herd_name: non_empty(Some(row.herd_name.as_str())),
            gmu_list: non_empty(Some(row.gmu_list.as_str())),
            post_hunt_estimate: coerce_i64(&row.estimate),
            male_female_ratio,
            state: ctx.state,
            species: ctx.species,
            year: ctx.year,
        });
    }

    out.log_summary("population", ctx);
    out
}
