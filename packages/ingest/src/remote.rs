//! Remote pipeline: table detection on a report in object storage, with
//! the parquet output uploaded back to the bucket.

use std::path::PathBuf;
use std::time::Duration;

use herd_knowledge_database::parquet::{write_harvest_parquet, write_population_parquet};
use herd_knowledge_database::paths::DataPaths;
use herd_knowledge_normalize::{normalize_harvest, normalize_population};
use herd_knowledge_storage::ObjectStore;
use herd_knowledge_storage::keys::{filename_base, processed_key};
use herd_knowledge_table::grid::reconstruct;
use herd_knowledge_textract::{DocumentAnalysis, JobStatus, get_blocks, wait_for_job};
use herd_knowledge_wildlife_models::{RecordContext, ReportKind};

use crate::{IngestError, IngestOutcome, Skip};

/// Client handles and local directories shared by remote runs.
pub struct RemoteDeps<'a> {
    pub store: &'a dyn ObjectStore,
    pub analysis: &'a dyn DocumentAnalysis,
    pub paths: &'a DataPaths,
    /// Delay between job status polls.
    pub poll_interval: Duration,
}

/// One raw report to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    pub ctx: RecordContext,
    pub kind: ReportKind,
    /// Object key of the raw PDF.
    pub key: String,
}

impl RemoteJob {
    /// Key the parquet output is uploaded to.
    #[must_use]
    pub fn output_key(&self) -> String {
        processed_key(
            self.ctx.state,
            self.ctx.species,
            self.kind,
            self.ctx.season.as_deref(),
            self.ctx.year,
            filename_base(&self.key),
        )
    }

    fn staging_path(&self, paths: &DataPaths) -> PathBuf {
        paths
            .staging_dir()
            .join(format!("{}.parquet", filename_base(&self.key)))
    }
}

/// Runs one raw report through table detection, grid reconstruction,
/// normalization, and the parquet writer, then uploads the file to its
/// processed key.
///
/// # Errors
///
/// Returns [`IngestError::JobFailed`] if the detection job fails, and
/// other [`IngestError`] variants if a service call, normalization, the
/// parquet write, or the upload fails. The staged parquet file is removed
/// whether or not the upload succeeds. A job that detects no cells, or a
/// table whose rows are all dropped, is an [`IngestOutcome::Skipped`].
pub async fn process_remote(
    deps: &RemoteDeps<'_>,
    job: &RemoteJob,
) -> Result<IngestOutcome, IngestError> {
    let bucket = deps.store.bucket();
    log::info!("Starting table analysis for s3://{bucket}/{}", job.key);

    let job_id = deps.analysis.start_table_analysis(bucket, &job.key).await?;
    log::info!("Started job {job_id}");

    if wait_for_job(deps.analysis, &job_id, deps.poll_interval).await? == JobStatus::Failed {
        log::error!("Job {job_id} failed for {}", job.key);
        return Err(IngestError::JobFailed {
            key: job.key.clone(),
            job_id,
        });
    }

    let blocks = get_blocks(deps.analysis, &job_id).await?;
    let table = match reconstruct(&blocks) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("Skipping {}: {e}", job.key);
            return Ok(IngestOutcome::Skipped(Skip::EmptyGrid));
        }
    };
    log::info!(
        "Reconstructed {} rows x {} columns from {}",
        table.len(),
        table.width(),
        job.key
    );

    let staging = job.staging_path(deps.paths);
    let records = match job.kind {
        ReportKind::Population => {
            let normalized = normalize_population(&table, &job.ctx)?;
            if normalized.records.is_empty() {
                log::warn!("Skipping {}: {}", job.key, Skip::NoRecords);
                return Ok(IngestOutcome::Skipped(Skip::NoRecords));
            }
            write_population_parquet(&normalized.records, &staging)?;
            normalized.records.len()
        }
        ReportKind::Harvest => {
            let normalized = normalize_harvest(&table, &job.ctx)?;
            if normalized.records.is_empty() {
                log::warn!("Skipping {}: {}", job.key, Skip::NoRecords);
                return Ok(IngestOutcome::Skipped(Skip::NoRecords));
            }
            write_harvest_parquet(&normalized.records, &staging)?;
            normalized.records.len()
        }
    };

    let output = job.output_key();
    let uploaded = deps.store.upload(&output, &staging).await;

    if let Err(e) = tokio::fs::remove_file(&staging).await {
        log::debug!("Could not remove {}: {e}", staging.display());
    }
    uploaded?;

    log::info!("Wrote {records} records to {output}");
    Ok(IngestOutcome::Processed { records, output })
}
