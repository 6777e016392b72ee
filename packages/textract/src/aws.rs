//! AWS Textract implementation of [`DocumentAnalysis`].

use async_trait::async_trait;
use aws_sdk_textract::types::{
    Block as TextractBlock, BlockType as TextractBlockType, DocumentLocation, FeatureType,
    JobStatus as TextractJobStatus, RelationshipType, S3Object,
};
use herd_knowledge_table::grid::{Block, BlockType};

use crate::{AnalysisPage, DocumentAnalysis, JobStatus, TextractError};

/// Table detection through Textract's asynchronous document analysis API.
///
/// Authentication uses the standard AWS credential chain (env vars, IAM
/// role, `~/.aws/credentials`).
pub struct TextractService {
    client: aws_sdk_textract::Client,
}

impl TextractService {
    /// Creates a client from the environment, optionally overriding the
    /// region.
    pub async fn new(region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_textract::Client::new(&config);

        Self { client }
    }
}

#[async_trait]
impl DocumentAnalysis for TextractService {
    async fn start_table_analysis(&self, bucket: &str, key: &str) -> Result<String, TextractError> {
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let output = self
            .client
            .start_document_analysis()
            .document_location(location)
            .feature_types(FeatureType::Tables)
            .send()
            .await
            .map_err(|e| TextractError::Start {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        let job_id = output
            .job_id()
            .ok_or_else(|| TextractError::MissingJobId {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?
            .to_string();

        log::info!("Started Textract job {job_id} for s3://{bucket}/{key}");
        Ok(job_id)
    }

    async fn get_page(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, TextractError> {
        let output = self
            .client
            .get_document_analysis()
            .job_id(job_id)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| TextractError::Fetch {
                job_id: job_id.to_string(),
                source: Box::new(e),
            })?;

        let status = output.job_status().map_or(JobStatus::Running, convert_status);
        let blocks = output.blocks().iter().map(convert_block).collect();

        Ok(AnalysisPage {
            status,
            blocks,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

/// Maps Textract's job states onto the three the pipeline distinguishes.
/// Partial success is treated as failure.
fn convert_status(status: &TextractJobStatus) -> JobStatus {
    match status {
        TextractJobStatus::InProgress => JobStatus::Running,
        TextractJobStatus::Succeeded => JobStatus::Succeeded,
        _ => JobStatus::Failed,
    }
}

fn convert_block(block: &TextractBlock) -> Block {
    let block_type = match block.block_type() {
        Some(TextractBlockType::Word) => BlockType::Word,
        Some(TextractBlockType::Cell) => BlockType::Cell,
        _ => BlockType::Other,
    };

    let child_ids = block
        .relationships()
        .iter()
        .filter(|r| r.r#type() == Some(&RelationshipType::Child))
        .flat_map(|r| r.ids().iter().cloned())
        .collect();

    Block {
        id: block.id().unwrap_or_default().to_string(),
        block_type,
        page: block
            .page()
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1),
        row_index: block.row_index().and_then(|r| u32::try_from(r).ok()),
        column_index: block.column_index().and_then(|c| u32::try_from(c).ok()),
        text: block.text().map(str::to_string),
        child_ids,
    }
}
