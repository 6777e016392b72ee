//! Parquet files of normalized records.
//!
//! Writing stages the records in an in-memory `DuckDB` table and copies it
//! out with `COPY ... (FORMAT PARQUET)`. The copy targets a temporary
//! sibling file that is renamed into place afterwards, so a failed write
//! never leaves a partial file at the destination.
//!
//! Reading tolerates files written before a column existed: missing
//! columns come back as `NULL`.

use std::path::{Path, PathBuf};

use duckdb::Connection;
use herd_knowledge_wildlife_models::{HarvestRecord, HerdPopulationRecord};

use crate::rows::{TableRow, column_definitions};
use crate::store::insert_rows;
use crate::{DbError, paths, sql_literal};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn path_literal(path: &Path) -> String {
    sql_literal(&path.to_string_lossy())
}

/// Writes records to a parquet file, replacing any existing file.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if staging, the copy, or the final rename fails.
pub fn write_parquet<R: TableRow>(records: &[R], path: &Path) -> Result<u64, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }

    let conn = Connection::open_in_memory()?;
    conn.execute_batch(&format!(
        "CREATE TABLE staged (\n    {}\n);",
        column_definitions::<R>(false)
    ))?;

    let rows: Vec<&R> = records.iter().collect();
    let written = insert_rows(&conn, "staged", &rows, false)?;

    let tmp = temp_path(path);
    if let Err(e) = conn.execute_batch(&format!(
        "COPY staged TO {} (FORMAT PARQUET);",
        path_literal(&tmp)
    )) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    std::fs::rename(&tmp, path)?;
    log::info!("Wrote {written} rows to {}", path.display());

    Ok(written)
}

/// Writes population records to a parquet file.
///
/// # Errors
///
/// See [`write_parquet`].
pub fn write_population_parquet(
    records: &[HerdPopulationRecord],
    path: &Path,
) -> Result<u64, DbError> {
    write_parquet(records, path)
}

/// Writes harvest records to a parquet file.
///
/// # Errors
///
/// See [`write_parquet`].
pub fn write_harvest_parquet(records: &[HarvestRecord], path: &Path) -> Result<u64, DbError> {
    write_parquet(records, path)
}

fn columns_with(conn: &Connection, path: &Path) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "DESCRIBE SELECT * FROM read_parquet({})",
        path_literal(path)
    ))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Returns the column names of a parquet file.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read as parquet.
pub fn parquet_columns(path: &Path) -> Result<Vec<String>, DbError> {
    let conn = Connection::open_in_memory()?;
    columns_with(&conn, path)
}

/// Reads records back from a parquet file.
///
/// Columns absent from the file are read as `NULL`; a file missing a
/// required column (such as `state`) fails to convert.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or a row cannot be
/// converted.
pub fn read_parquet<R: TableRow>(path: &Path) -> Result<Vec<R>, DbError> {
    let conn = Connection::open_in_memory()?;
    let present = columns_with(&conn, path)?;

    let select: Vec<String> = R::COLUMNS
        .iter()
        .map(|(name, ty)| {
            if present.iter().any(|c| c == name) {
                format!("CAST({name} AS {ty}) AS {name}")
            } else {
                log::debug!("{} has no {name} column", path.display());
                format!("CAST(NULL AS {ty}) AS {name}")
            }
        })
        .collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM read_parquet({})",
        select.join(", "),
        path_literal(path)
    ))?;
    let records = stmt
        .query_map([], R::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Reads population records from a parquet file.
///
/// # Errors
///
/// See [`read_parquet`].
pub fn read_population_parquet(path: &Path) -> Result<Vec<HerdPopulationRecord>, DbError> {
    read_parquet(path)
}

/// Reads harvest records from a parquet file.
///
/// # Errors
///
/// See [`read_parquet`].
pub fn read_harvest_parquet(path: &Path) -> Result<Vec<HarvestRecord>, DbError> {
    read_parquet(path)
}

#[cfg(test)]
mod tests {
    use herd_knowledge_wildlife_models::{Species, StateCode};

    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("herd_knowledge_parquet_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn herd(name: Option<&str>, ratio: Option<f64>) -> HerdPopulationRecord {
        HerdPopulationRecord {
            dau: Some("12".to_string()),
            herd_name: name.map(str::to_string),
            gmu_list: Some("76,77,78".to_string()),
            post_hunt_estimate: Some(1250),
            male_female_ratio: ratio,
            state: StateCode::Co,
            species: Species::Elk,
            year: 2023,
        }
    }

    #[test]
    fn population_file_reads_back() {
        let dir = test_dir("population");
        let path = dir.join("2023").join("colorado_elk_population_2023.parquet");
        let records = vec![herd(Some("South Park"), Some(18.0)), herd(None, None)];

        assert_eq!(write_population_parquet(&records, &path).unwrap(), 2);

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        assert_eq!(read_population_parquet(&path).unwrap(), records);
        assert!(
            parquet_columns(&path)
                .unwrap()
                .contains(&"male_female_ratio".to_string())
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn harvest_file_reads_back() {
        let dir = test_dir("harvest");
        let path = dir.join("harvest.parquet");
        let records = vec![HarvestRecord {
            state: StateCode::Co,
            species: Species::Deer,
            season: "archery".to_string(),
            year: 2022,
            unit: 7,
            adult_male: Some(300),
            adult_female: None,
            young: Some(8),
            total_harvest: Some(308),
            total_hunters: Some(2000),
            percent_success: Some(15.4),
            total_rec_days: None,
        }];

        write_harvest_parquet(&records, &path).unwrap();

        assert_eq!(read_harvest_parquet(&path).unwrap(), records);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_columns_read_as_null() {
        let dir = test_dir("stale");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stale.parquet");

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "COPY (SELECT 'co' AS state, 'elk' AS species, 2019 AS year,
                          'South Park' AS herd_name, 1250 AS post_hunt_estimate)
             TO {} (FORMAT PARQUET);",
            path_literal(&path)
        ))
        .unwrap();

        assert!(
            !parquet_columns(&path)
                .unwrap()
                .contains(&"male_female_ratio".to_string())
        );

        let records = read_population_parquet(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].herd_name.as_deref(), Some("South Park"));
        assert_eq!(records[0].post_hunt_estimate, Some(1250));
        assert_eq!(records[0].male_female_ratio, None);
        assert_eq!(records[0].dau, None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("/data/x.parquet")),
            PathBuf::from("/data/x.parquet.tmp")
        );
    }
}
