#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Asynchronous table-detection jobs.
//!
//! Reports that are too irregular for local text extraction are sent to a
//! remote document-analysis service (AWS Textract). The service works in
//! three steps: a job is started against a PDF already in object storage,
//! the job is polled until it finishes, and the detected blocks are read
//! back page by page.
//!
//! The service is modelled by the [`DocumentAnalysis`] trait so the
//! pipelines can run against a scripted fake. [`TextractService`] is the
//! real implementation.

pub mod aws;

use std::time::Duration;

use async_trait::async_trait;
use herd_knowledge_table::grid::Block;

pub use aws::TextractService;

/// Interval between job status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Errors that can occur while talking to the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum TextractError {
    /// Starting the analysis job failed.
    #[error("Failed to start analysis of s3://{bucket}/{key}: {source}")]
    Start {
        /// Bucket holding the document.
        bucket: String,
        /// Object key of the document.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Fetching job status or results failed.
    #[error("Failed to fetch analysis job {job_id}: {source}")]
    Fetch {
        /// Job identifier.
        job_id: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service accepted the job but returned no job id.
    #[error("Analysis service returned no job id for s3://{bucket}/{key}")]
    MissingJobId {
        /// Bucket holding the document.
        bucket: String,
        /// Object key of the document.
        key: String,
    },
}

/// State of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        })
    }
}

/// One page of analysis results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPage {
    pub status: JobStatus,
    pub blocks: Vec<Block>,
    /// Token for the next page, if there is one.
    pub next_token: Option<String>,
}

/// A remote document-analysis service that detects tables.
#[async_trait]
pub trait DocumentAnalysis: Send + Sync {
    /// Starts table detection on a document in object storage and returns
    /// the job id.
    ///
    /// # Errors
    ///
    /// Returns [`TextractError`] if the job could not be started.
    async fn start_table_analysis(&self, bucket: &str, key: &str) -> Result<String, TextractError>;

    /// Fetches the job status and one page of its blocks.
    ///
    /// # Errors
    ///
    /// Returns [`TextractError`] if the request fails.
    async fn get_page(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, TextractError>;
}

/// Polls a job at a fixed interval until it succeeds or fails.
///
/// There is no attempt limit and no backoff: a job that never leaves the
/// running state blocks the caller indefinitely.
///
/// # Errors
///
/// Returns [`TextractError`] if a status request fails.
pub async fn wait_for_job(
    service: &dyn DocumentAnalysis,
    job_id: &str,
    interval: Duration,
) -> Result<JobStatus, TextractError> {
    loop {
        let page = service.get_page(job_id, None).await?;
        log::info!("Job {job_id} status: {}", page.status);

        match page.status {
            JobStatus::Succeeded | JobStatus::Failed => return Ok(page.status),
            JobStatus::Running => tokio::time::sleep(interval).await,
        }
    }
}

/// Reads every block of a finished job, following continuation tokens.
///
/// # Errors
///
/// Returns [`TextractError`] if any page request fails.
pub async fn get_blocks(
    service: &dyn DocumentAnalysis,
    job_id: &str,
) -> Result<Vec<Block>, TextractError> {
    let mut blocks = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = service.get_page(job_id, next_token.as_deref()).await?;
        pages += 1;
        blocks.extend(page.blocks);

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    log::info!(
        "Fetched {} blocks in {pages} result page(s) for job {job_id}",
        blocks.len()
    );
    Ok(blocks)
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Scripted analysis service.
    ///
    /// Status polls (no token) pop from `statuses`, holding the last one;
    /// result pages are looked up by token, with `""` for the first page.
    pub struct FakeAnalysis {
        pub statuses: Mutex<VecDeque<JobStatus>>,
        pub pages: BTreeMap<String, AnalysisPage>,
        pub polls: Mutex<u32>,
    }

    impl FakeAnalysis {
        pub fn new(statuses: &[JobStatus], pages: Vec<(&str, AnalysisPage)>) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                pages: pages
                    .into_iter()
                    .map(|(token, page)| (token.to_string(), page))
                    .collect(),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentAnalysis for FakeAnalysis {
        async fn start_table_analysis(
            &self,
            _bucket: &str,
            key: &str,
        ) -> Result<String, TextractError> {
            Ok(format!("job-{key}"))
        }

        async fn get_page(
            &self,
            _job_id: &str,
            next_token: Option<&str>,
        ) -> Result<AnalysisPage, TextractError> {
            *self.polls.lock().unwrap() += 1;

            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(JobStatus::Succeeded)
            };

            let mut page = self
                .pages
                .get(next_token.unwrap_or(""))
                .cloned()
                .unwrap_or(AnalysisPage {
                    status,
                    blocks: Vec::new(),
                    next_token: None,
                });
            page.status = status;
            Ok(page)
        }
    }
}
