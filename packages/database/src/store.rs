//! Record tables: creation, rebuild, upsert, and counts.

use std::collections::BTreeMap;

use duckdb::Connection;
use herd_knowledge_wildlife_models::{HarvestRecord, HerdPopulationRecord, Species};

use crate::DbError;
use crate::rows::{TableRow, column_definitions, table_name};

/// Rows per INSERT statement.
const CHUNK_SIZE: usize = 1_000;

/// Creates the table for `R` and `species` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub fn create_table<R: TableRow>(conn: &Connection, species: Species) -> Result<(), DbError> {
    let table = table_name::<R>(species);
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n);",
        column_definitions::<R>(true)
    ))?;
    Ok(())
}

/// Drops and recreates the table for `R` and `species`.
///
/// This is the only migration path when the table's key changes; every
/// existing row is lost.
///
/// # Errors
///
/// Returns [`DbError`] if either statement fails.
pub fn rebuild_table<R: TableRow>(conn: &Connection, species: Species) -> Result<(), DbError> {
    let table = table_name::<R>(species);
    log::warn!("Dropping and recreating {table}");
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    create_table::<R>(conn, species)
}

/// Upserts records into their species tables, creating tables as needed.
///
/// Within the batch, later records with the same key replace earlier ones.
/// On conflict with a stored row only the non-key columns are updated, so
/// loading the same records twice leaves the table unchanged.
///
/// Every record's key is checked before anything is written.
///
/// Returns the number of rows affected.
///
/// # Errors
///
/// Returns [`DbError::MissingKey`] if any record lacks a key field, or a
/// `DuckDB` error if a statement fails.
pub fn upsert<R: TableRow>(conn: &Connection, records: &[R]) -> Result<u64, DbError> {
    let mut by_table: BTreeMap<Species, BTreeMap<R::Key, &R>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let species = record.species();
        let key = record.key(&table_name::<R>(species), index)?;
        by_table.entry(species).or_default().insert(key, record);
    }

    let mut total = 0u64;

    for (species, deduped) in by_table {
        let table = table_name::<R>(species);
        let rows: Vec<&R> = deduped.into_values().collect();
        let batch_len = records.iter().filter(|r| r.species() == species).count();

        if rows.len() < batch_len {
            log::info!(
                "Deduplicated {table} batch: {batch_len} -> {} rows ({} duplicates removed)",
                rows.len(),
                batch_len - rows.len(),
            );
        }

        create_table::<R>(conn, species)?;
        total += insert_rows(conn, &table, &rows, true)?;
        log::info!("Upserted {} rows into {table}", rows.len());
    }

    Ok(total)
}

/// Upserts population records keyed by `(state, herd_name, year)`.
///
/// # Errors
///
/// See [`upsert`].
pub fn upsert_population(
    conn: &Connection,
    records: &[HerdPopulationRecord],
) -> Result<u64, DbError> {
    upsert(conn, records)
}

/// Upserts harvest records keyed by `(state, season, year, unit)`.
///
/// # Errors
///
/// See [`upsert`].
pub fn upsert_harvest(conn: &Connection, records: &[HarvestRecord]) -> Result<u64, DbError> {
    upsert(conn, records)
}

/// Drops and recreates a species' population table.
///
/// # Errors
///
/// See [`rebuild_table`].
pub fn rebuild_population_table(conn: &Connection, species: Species) -> Result<(), DbError> {
    rebuild_table::<HerdPopulationRecord>(conn, species)
}

/// Inserts rows in chunks, optionally resolving key conflicts by updating
/// the non-key columns.
pub(crate) fn insert_rows<R: TableRow>(
    conn: &Connection,
    table: &str,
    rows: &[&R],
    on_conflict_update: bool,
) -> Result<u64, DbError> {
    let columns: Vec<&str> = R::COLUMNS.iter().map(|(name, _)| *name).collect();
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));

    let conflict_clause = if on_conflict_update {
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !R::KEY_COLUMNS.contains(c))
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();
        format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            R::KEY_COLUMNS.join(", "),
            updates.join(", ")
        )
    } else {
        String::new()
    };

    let mut total = 0u64;

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut sql = format!("INSERT INTO {table} ({}) VALUES ", columns.join(", "));
        sql.push_str(&vec![placeholders.as_str(); chunk.len()].join(", "));
        sql.push_str(&conflict_clause);

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for row in chunk {
            row.bind(&mut stmt, param_idx)?;
            param_idx += columns.len();
        }

        let affected = stmt.raw_execute()?;
        total += u64::try_from(affected).unwrap_or(0);
    }

    Ok(total)
}

/// Returns the number of rows in the table for `R` and `species`, or 0 if
/// the table does not exist yet.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn count_rows<R: TableRow>(conn: &Connection, species: Species) -> Result<u64, DbError> {
    let table = table_name::<R>(species);

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
        [&table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(0);
    }

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Reads every row of the table for `R` and `species`, ordered by key.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn select_all<R: TableRow>(conn: &Connection, species: Species) -> Result<Vec<R>, DbError> {
    let table = table_name::<R>(species);
    let columns: Vec<&str> = R::COLUMNS.iter().map(|(name, _)| *name).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {table} ORDER BY {}",
        columns.join(", "),
        R::KEY_COLUMNS.join(", ")
    ))?;
    let rows = stmt
        .query_map([], R::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use herd_knowledge_wildlife_models::StateCode;

    use super::*;

    fn herd(name: &str, year: i32, estimate: i64, ratio: f64) -> HerdPopulationRecord {
        HerdPopulationRecord {
            dau: Some("12".to_string()),
            herd_name: Some(name.to_string()),
            gmu_list: Some("76,77,78".to_string()),
            post_hunt_estimate: Some(estimate),
            male_female_ratio: Some(ratio),
            state: StateCode::Co,
            species: Species::Elk,
            year,
        }
    }

    fn harvest(unit: i64, total: i64) -> HarvestRecord {
        HarvestRecord {
            state: StateCode::Co,
            species: Species::Elk,
            season: "rifle".to_string(),
            year: 2022,
            unit,
            adult_male: Some(10),
            adult_female: None,
            young: Some(1),
            total_harvest: Some(total),
            total_hunters: Some(100),
            percent_success: Some(11.5),
            total_rec_days: None,
        }
    }

    #[test]
    fn upsert_twice_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let records = vec![
            herd("South Park", 2023, 1250, 18.0),
            herd("Frying Pan", 2023, 900, 22.0),
        ];

        upsert_population(&conn, &records).unwrap();
        let first = select_all::<HerdPopulationRecord>(&conn, Species::Elk).unwrap();
        upsert(&conn, &records).unwrap();
        let second = select_all::<HerdPopulationRecord>(&conn, Species::Elk).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn conflicting_key_updates_measurements() {
        let conn = Connection::open_in_memory().unwrap();

        upsert(&conn, &[herd("South Park", 2023, 1250, 18.0)]).unwrap();
        upsert(&conn, &[herd("South Park", 2023, 1400, 20.0)]).unwrap();
        upsert(&conn, &[herd("South Park", 2024, 1500, 21.0)]).unwrap();

        let rows = select_all::<HerdPopulationRecord>(&conn, Species::Elk).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].post_hunt_estimate, Some(1400));
        assert_eq!(rows[0].male_female_ratio, Some(20.0));
        assert_eq!(rows[1].year, 2024);
    }

    #[test]
    fn last_duplicate_in_batch_wins() {
        let conn = Connection::open_in_memory().unwrap();
        upsert_harvest(&conn, &[harvest(7, 100), harvest(8, 50), harvest(7, 120)]).unwrap();

        let rows = select_all::<HarvestRecord>(&conn, Species::Elk).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unit, 7);
        assert_eq!(rows[0].total_harvest, Some(120));
        assert_eq!(rows[0].adult_female, None);
    }

    #[test]
    fn missing_herd_name_writes_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        let mut nameless = herd("x", 2023, 1, 1.0);
        nameless.herd_name = None;

        let result = upsert(&conn, &[herd("South Park", 2023, 1250, 18.0), nameless]);

        assert!(matches!(result, Err(DbError::MissingKey { index: 1, .. })));
        assert_eq!(count_rows::<HerdPopulationRecord>(&conn, Species::Elk).unwrap(), 0);
    }

    #[test]
    fn records_go_to_species_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let mut deer = herd("Uncompahgre", 2023, 5000, 31.0);
        deer.species = Species::Deer;

        upsert(&conn, &[herd("South Park", 2023, 1250, 18.0), deer]).unwrap();

        assert_eq!(count_rows::<HerdPopulationRecord>(&conn, Species::Elk).unwrap(), 1);
        assert_eq!(count_rows::<HerdPopulationRecord>(&conn, Species::Deer).unwrap(), 1);
        assert_eq!(count_rows::<HerdPopulationRecord>(&conn, Species::Pronghorn).unwrap(), 0);
    }

    #[test]
    fn rebuild_empties_table() {
        let conn = Connection::open_in_memory().unwrap();
        upsert(&conn, &[herd("South Park", 2023, 1250, 18.0)]).unwrap();

        rebuild_population_table(&conn, Species::Elk).unwrap();

        assert_eq!(count_rows::<HerdPopulationRecord>(&conn, Species::Elk).unwrap(), 0);
    }
}
