//! Local population pipeline: PDF on disk to parquet and `DuckDB`.

use std::path::Path;

use duckdb::Connection;
use herd_knowledge_database::parquet::write_population_parquet;
use herd_knowledge_database::paths::DataPaths;
use herd_knowledge_database::store::upsert_population;
use herd_knowledge_normalize::normalize_dau_rows;
use herd_knowledge_pdf::TableExtractor;
use herd_knowledge_pdf::dau_rows::parse_dau_table;
use herd_knowledge_storage::keys::{filename_base, processed_key};
use herd_knowledge_table::LogicalTable;
use herd_knowledge_wildlife_models::{RecordContext, ReportKind};

use crate::{IngestError, IngestOutcome, Skip};

fn skipped(pdf_path: &Path, reason: Skip) -> IngestOutcome {
    log::warn!("Skipping {}: {reason}", pdf_path.display());
    IngestOutcome::Skipped(reason)
}

/// Runs a local population report through extraction, row parsing,
/// normalization, the parquet writer, and the upsert loader.
///
/// Only the first extracted table is used. Rows the DAU parser cannot
/// split are skipped and logged. The parquet file lands under `paths` at
/// the conventional processed key for the report, after the upsert has
/// succeeded.
///
/// # Errors
///
/// Returns [`IngestError`] if extraction, the parquet write, or the upsert
/// fails. A missing file, a PDF without a table, or a table without
/// usable rows is an [`IngestOutcome::Skipped`] instead.
pub fn ingest_local_population(
    extractor: &dyn TableExtractor,
    pdf_path: &Path,
    ctx: &RecordContext,
    paths: &DataPaths,
    conn: &Connection,
) -> Result<IngestOutcome, IngestError> {
    if !pdf_path.exists() {
        return Ok(skipped(pdf_path, Skip::MissingFile(pdf_path.to_path_buf())));
    }

    log::info!(
        "Extracting {} {} population {} from {}",
        ctx.state,
        ctx.species,
        ctx.year,
        pdf_path.display()
    );

    let Some(raw) = extractor.extract_tables(pdf_path)?.into_iter().next() else {
        return Ok(skipped(pdf_path, Skip::NoTable));
    };

    let table = LogicalTable::from_optional_rows(raw);
    if table.data_rows().is_empty() {
        return Ok(skipped(pdf_path, Skip::NoRows));
    }

    let parsed = parse_dau_table(&table);
    let normalized = normalize_dau_rows(&parsed.rows, ctx);
    if normalized.records.is_empty() {
        return Ok(skipped(pdf_path, Skip::NoRecords));
    }

    let file_name = pdf_path.to_string_lossy();
    let key = processed_key(
        ctx.state,
        ctx.species,
        ReportKind::Population,
        None,
        ctx.year,
        filename_base(&file_name),
    );
    let output = paths.local_path(&key);

    // The parquet file is only written once the rows are in the database.
    let upserted = upsert_population(conn, &normalized.records)?;
    log::info!(
        "Upserted {upserted} {} population rows for {} {}",
        ctx.species,
        ctx.state,
        ctx.year
    );
    write_population_parquet(&normalized.records, &output)?;

    Ok(IngestOutcome::Processed {
        records: normalized.records.len(),
        output: output.to_string_lossy().into_owned(),
    })
}
