//! Detection of processed population files that predate the ratio column.

use std::path::Path;

use herd_knowledge_database::parquet::parquet_columns;
use herd_knowledge_storage::ObjectStore;
use herd_knowledge_storage::keys::is_processed_population_key;

use crate::IngestError;

const RATIO_COLUMN: &str = "male_female_ratio";

/// Lists processed population files that have no `male_female_ratio`
/// column and need to be regenerated.
///
/// Each file is downloaded under `staging_dir`, inspected, and removed.
/// Files that cannot be read as parquet are logged and left out of the
/// result.
///
/// # Errors
///
/// Returns [`IngestError`] if listing or downloading fails.
pub async fn audit_stale_population(
    store: &dyn ObjectStore,
    staging_dir: &Path,
) -> Result<Vec<String>, IngestError> {
    let keys: Vec<String> = store
        .list_keys("processed/")
        .await?
        .into_iter()
        .filter(|key| is_processed_population_key(key))
        .collect();
    log::info!("Checking {} processed population files", keys.len());

    let local = staging_dir.join("audit.parquet");
    let mut stale = Vec::new();

    for key in keys {
        store.download(&key, &local).await?;

        match parquet_columns(&local) {
            Ok(columns) if columns.iter().any(|c| c == RATIO_COLUMN) => {
                log::debug!("{key} has {RATIO_COLUMN}");
            }
            Ok(_) => {
                log::warn!("{key} is missing {RATIO_COLUMN}");
                stale.push(key);
            }
            Err(e) => log::error!("Could not read {key}: {e}"),
        }
    }

    if local.exists() {
        tokio::fs::remove_file(&local).await?;
    }

    log::info!("{} stale population files", stale.len());
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use duckdb::Connection;
    use herd_knowledge_database::parquet::write_population_parquet;
    use herd_knowledge_wildlife_models::{HerdPopulationRecord, Species, StateCode};

    use super::*;
    use crate::fakes::MemoryStore;

    #[tokio::test]
    async fn reports_files_without_ratio_column() {
        let dir = std::env::temp_dir().join("herd_knowledge_audit");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let current = dir.join("current.parquet");
        write_population_parquet(
            &[HerdPopulationRecord {
                dau: Some("E-9".to_string()),
                herd_name: Some("South Park".to_string()),
                gmu_list: None,
                post_hunt_estimate: Some(12_400),
                male_female_ratio: Some(24.0),
                state: StateCode::Co,
                species: Species::Elk,
                year: 2023,
            }],
            &current,
        )
        .unwrap();

        let old = dir.join("old.parquet");
        Connection::open_in_memory()
            .unwrap()
            .execute_batch(&format!(
                "COPY (SELECT 'co' AS state, 'South Park' AS herd_name, 2019 AS year) TO '{}' (FORMAT PARQUET);",
                old.display()
            ))
            .unwrap();

        let store = MemoryStore::default();
        store.put(
            "processed/co/elk/population/2023/current.parquet",
            std::fs::read(&current).unwrap(),
        );
        store.put(
            "processed/co/elk/population/2019/old.parquet",
            std::fs::read(&old).unwrap(),
        );
        store.put(
            "processed/co/elk/population/2018/broken.parquet",
            b"not parquet".to_vec(),
        );
        store.put(
            "processed/co/elk/harvest/rifle/2019/old.parquet",
            std::fs::read(&old).unwrap(),
        );

        let stale = audit_stale_population(&store, &dir.join("staging"))
            .await
            .unwrap();

        assert_eq!(
            stale,
            vec!["processed/co/elk/population/2019/old.parquet".to_string()]
        );
        assert!(!dir.join("staging").join("audit.parquet").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
