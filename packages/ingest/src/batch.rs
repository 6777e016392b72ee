//! Batch mode: every unprocessed report of one series, one at a time.

use herd_knowledge_cli_utils::ProgressCallback;
use herd_knowledge_normalize::NormalizeError;
use herd_knowledge_storage::keys::{raw_key, raw_prefix, year_from_key};
use herd_knowledge_wildlife_models::{RecordContext, ReportKind, Species, StateCode};

use crate::remote::{RemoteDeps, RemoteJob, process_remote};
use crate::{IngestError, IngestOutcome};

/// Which reports to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub state: StateCode,
    pub species: Species,
    pub kind: ReportKind,
    /// Required for harvest reports.
    pub season: Option<String>,
    /// A single year; `None` discovers every year in storage.
    pub year: Option<i32>,
}

impl BatchRequest {
    fn job(&self, key: String, year: i32) -> RemoteJob {
        let mut ctx = RecordContext::new(self.state, self.species, year);
        ctx.season.clone_from(&self.season);
        RemoteJob {
            ctx,
            kind: self.kind,
            key,
        }
    }
}

/// Tally of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Reports written to their processed key.
    pub processed: usize,
    /// Reports whose processed key already existed.
    pub skipped_existing: usize,
    /// Raw keys without a year in the file name.
    pub skipped_unparseable: usize,
    /// Reports that produced no records.
    pub skipped_empty: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Processed { .. } => self.processed += 1,
            IngestOutcome::Skipped(_) => self.skipped_empty += 1,
        }
    }
}

/// Processes one report series through the remote pipeline.
///
/// With a year, only the conventional raw key for that year is a
/// candidate. Without one, every `.pdf` under the series prefix is, with
/// its year taken from the file name. Either way a report is skipped when
/// its processed key already exists, so re-running only picks up new
/// reports.
///
/// # Errors
///
/// Returns [`IngestError`] on the first report that fails; reports
/// processed before it keep their output. A harvest request without a
/// season fails before any work is done.
pub async fn run_batch(
    deps: &RemoteDeps<'_>,
    request: &BatchRequest,
    progress: &dyn ProgressCallback,
) -> Result<BatchSummary, IngestError> {
    if request.kind == ReportKind::Harvest && request.season.is_none() {
        return Err(NormalizeError::MissingSeason.into());
    }

    let season = request.season.as_deref();
    let mut summary = BatchSummary::default();

    if let Some(year) = request.year {
        let key = raw_key(request.state, request.species, request.kind, season, year);
        progress.set_total(1);
        progress.set_message(key.clone());
        let job = request.job(key, year);
        let output = job.output_key();
        if deps.store.exists(&output).await? {
            log::info!("{output} already exists, skipping");
            summary.skipped_existing += 1;
            progress.inc(1);
            progress.finish("already processed".to_string());
            return Ok(summary);
        }
        let outcome = process_remote(deps, &job).await?;
        summary.record(&outcome);
        progress.inc(1);
        progress.finish(format!("{} processed", summary.processed));
        return Ok(summary);
    }

    let prefix = raw_prefix(request.state, request.species, request.kind, season);
    let candidates: Vec<String> = deps
        .store
        .list_keys(&prefix)
        .await?
        .into_iter()
        .filter(|key| key.ends_with(".pdf"))
        .collect();
    log::info!("Found {} raw reports under {prefix}", candidates.len());
    progress.set_total(candidates.len() as u64);

    for key in candidates {
        progress.set_message(key.clone());

        let Some(year) = year_from_key(&key) else {
            log::warn!("Could not determine year from {key}, skipping");
            summary.skipped_unparseable += 1;
            progress.inc(1);
            continue;
        };

        let job = request.job(key, year);
        let output = job.output_key();
        if deps.store.exists(&output).await? {
            log::info!("{output} already exists, skipping");
            summary.skipped_existing += 1;
            progress.inc(1);
            continue;
        }

        let outcome = process_remote(deps, &job).await?;
        summary.record(&outcome);
        progress.inc(1);
    }

    log::info!(
        "Batch complete: {} processed, {} already processed, {} without a year, {} empty",
        summary.processed,
        summary.skipped_existing,
        summary.skipped_unparseable,
        summary.skipped_empty
    );
    progress.finish(format!(
        "{} processed, {} skipped",
        summary.processed,
        summary.skipped_existing + summary.skipped_unparseable + summary.skipped_empty
    ));

    Ok(summary)
}
