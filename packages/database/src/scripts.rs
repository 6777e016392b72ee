//! SQL script runner and S3 session settings for hydration.
//!
//! Schema creation and hydration are plain `.sql` files executed in file
//! name order. A failing script is reported and the rest still run.

use std::path::{Path, PathBuf};

use duckdb::Connection;

use crate::{DbError, sql_literal};

/// Region used when `AWS_REGION` is unset.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Outcome of running a directory of scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl ScriptReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lists `*.sql` files directly in `dir`, sorted by name.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn sql_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();
    Ok(files)
}

/// Executes every `.sql` file in `dir` in sorted order.
///
/// # Errors
///
/// Returns [`DbError::Io`] if the directory cannot be listed. Failures of
/// individual scripts are collected in the report instead.
pub fn run_sql_scripts(conn: &Connection, dir: &Path) -> Result<ScriptReport, DbError> {
    let files = sql_files(dir)?;
    log::info!("Running {} SQL scripts from {}", files.len(), dir.display());

    let mut report = ScriptReport::default();

    for file in files {
        log::info!("Executing {}", file.display());

        let result = std::fs::read_to_string(&file)
            .map_err(DbError::from)
            .and_then(|sql| conn.execute_batch(&sql).map_err(DbError::from));

        match result {
            Ok(()) => {
                log::info!("Executed {}", file.display());
                report.succeeded.push(file);
            }
            Err(e) => {
                log::error!("Failed to execute {}: {e}", file.display());
                report.failed.push((file, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Builds the `SET s3_*` statements for a session, or `None` when either
/// credential is missing.
#[must_use]
pub fn s3_settings_sql(
    region: Option<&str>,
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
) -> Option<String> {
    let access_key_id = access_key_id.filter(|s| !s.is_empty())?;
    let secret_access_key = secret_access_key.filter(|s| !s.is_empty())?;
    let region = region
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_S3_REGION);

    Some(format!(
        "SET s3_region={};\nSET s3_access_key_id={};\nSET s3_secret_access_key={};\nSET s3_url_style='path';",
        sql_literal(region),
        sql_literal(access_key_id),
        sql_literal(secret_access_key),
    ))
}

/// Configures the session for reading `s3://` paths using `AWS_REGION`,
/// `AWS_ACCESS_KEY_ID`, and `AWS_SECRET_ACCESS_KEY`.
///
/// Returns `false` (with a warning) when credentials are not set; reads
/// from S3 will then fail.
///
/// # Errors
///
/// Returns [`DbError`] if the settings cannot be applied.
pub fn configure_s3(conn: &Connection) -> Result<bool, DbError> {
    let region = std::env::var("AWS_REGION").ok();
    let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok();
    let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok();

    let Some(sql) = s3_settings_sql(
        region.as_deref(),
        access_key_id.as_deref(),
        secret_access_key.as_deref(),
    ) else {
        log::warn!("AWS credentials not found in environment; S3 reads will fail");
        return Ok(false);
    };

    conn.execute_batch(&sql)?;
    log::info!("DuckDB S3 configuration set");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use herd_knowledge_wildlife_models::{HarvestRecord, HerdPopulationRecord, Species, StateCode};

    use super::*;
    use crate::parquet::{write_harvest_parquet, write_population_parquet};

    /// Points a hydration script at a local processed directory.
    fn localize(script: &str, processed: &Path) -> String {
        script
            .lines()
            .filter(|line| !line.starts_with("INSTALL") && !line.starts_with("LOAD"))
            .collect::<Vec<_>>()
            .join("\n")
            .replace("s3://herd-knowledge/processed", &processed.to_string_lossy())
    }

    fn population(estimate: i64) -> HerdPopulationRecord {
        HerdPopulationRecord {
            dau: Some("E-9".to_string()),
            herd_name: Some("South Park".to_string()),
            gmu_list: None,
            post_hunt_estimate: Some(estimate),
            male_female_ratio: Some(24.0),
            state: StateCode::Co,
            species: Species::Elk,
            year: 2022,
        }
    }

    fn harvest(total: i64) -> HarvestRecord {
        HarvestRecord {
            state: StateCode::Co,
            species: Species::Elk,
            season: "rifle".to_string(),
            year: 2022,
            unit: 7,
            adult_male: Some(10),
            adult_female: None,
            young: None,
            total_harvest: Some(total),
            total_hunters: None,
            percent_success: None,
            total_rec_days: None,
        }
    }

    #[test]
    fn hydration_collapses_duplicate_keys_across_files() {
        let dir = std::env::temp_dir().join("herd_knowledge_hydrate_dupes");
        let _ = std::fs::remove_dir_all(&dir);
        let processed = dir.join("processed");
        let population_dir = processed.join("co/elk/population/2022");
        let harvest_dir = processed.join("co/elk/harvest/rifle/2022");

        write_population_parquet(&[population(12_000)], &population_dir.join("a.parquet")).unwrap();
        write_population_parquet(&[population(12_400)], &population_dir.join("b.parquet")).unwrap();
        write_harvest_parquet(&[harvest(14)], &harvest_dir.join("a.parquet")).unwrap();
        write_harvest_parquet(&[harvest(15)], &harvest_dir.join("b.parquet")).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../../sql/create/01_elk_population.sql"))
            .unwrap();
        conn.execute_batch(include_str!("../../../sql/create/01_elk_harvest.sql"))
            .unwrap();

        for script in [
            include_str!("../../../sql/load/01_population.sql"),
            include_str!("../../../sql/load/02_harvest.sql"),
        ] {
            conn.execute_batch(&localize(script, &processed)).unwrap();
            // A second hydration updates in place.
            conn.execute_batch(&localize(script, &processed)).unwrap();
        }

        let (rows, estimate): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(post_hunt_estimate) FROM elk_population",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((rows, estimate), (1, 12_400));

        let (rows, total): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(total_harvest) FROM elk_harvest",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((rows, total), (1, 15));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn runs_scripts_in_order_and_reports_failures() {
        let dir = std::env::temp_dir().join("herd_knowledge_scripts_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(dir.join("01_create.sql"), "CREATE TABLE t (x INTEGER);").unwrap();
        std::fs::write(dir.join("02_broken.sql"), "INSERT INTO missing VALUES (1);").unwrap();
        std::fs::write(dir.join("03_insert.sql"), "INSERT INTO t VALUES (1), (2);").unwrap();
        std::fs::write(dir.join("README.md"), "not sql").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        let report = run_sql_scripts(&conn, &dir).unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("02_broken.sql"));
        assert!(!report.is_success());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        let missing = std::env::temp_dir().join("herd_knowledge_no_such_sql_dir");
        let _ = std::fs::remove_dir_all(&missing);
        assert!(matches!(
            run_sql_scripts(&conn, &missing),
            Err(DbError::Io(_))
        ));
    }

    #[test]
    fn s3_settings_require_both_credentials() {
        assert_eq!(s3_settings_sql(None, Some("key"), None), None);
        assert_eq!(s3_settings_sql(None, Some(""), Some("secret")), None);

        let sql = s3_settings_sql(None, Some("key"), Some("se'cret")).unwrap();
        assert!(sql.contains("SET s3_region='us-east-1';"));
        assert!(sql.contains("SET s3_secret_access_key='se''cret';"));
        assert!(sql.ends_with("SET s3_url_style='path';"));
    }
}
