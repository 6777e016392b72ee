//! In-memory stand-ins for object storage, table detection, and PDF
//! extraction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use herd_knowledge_pdf::{PdfError, RawTable, TableExtractor};
use herd_knowledge_storage::{ObjectStore, StorageError};
use herd_knowledge_table::grid::Block;
use herd_knowledge_textract::{AnalysisPage, DocumentAnalysis, JobStatus, TextractError};

/// Returns the same tables for every path.
pub struct CannedExtractor {
    tables: Vec<RawTable>,
}

impl CannedExtractor {
    pub const fn new(tables: Vec<RawTable>) -> Self {
        Self { tables }
    }
}

impl TableExtractor for CannedExtractor {
    fn extract_tables(&self, _path: &Path) -> Result<Vec<RawTable>, PdfError> {
        Ok(self.tables.clone())
    }
}

/// Object store backed by a map of key to bytes.
///
/// A read-only store rejects every upload.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub read_only: bool,
}

impl MemoryStore {
    pub fn with_keys(keys: &[&str]) -> Self {
        let store = Self::default();
        for key in keys {
            store.put(key, b"%PDF-1.4".to_vec());
        }
        store
    }

    pub fn read_only(keys: &[&str]) -> Self {
        Self {
            read_only: true,
            ..Self::with_keys(keys)
        }
    }

    pub fn put(&self, key: &str, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        "test-bucket"
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn upload(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Upload {
                bucket: "test-bucket".to_string(),
                key: key.to_string(),
                source: "read-only store".into(),
            });
        }
        let bytes = tokio::fs::read(local_path).await?;
        self.put(key, bytes);
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let bytes = self.objects.lock().unwrap().get(key).cloned().ok_or_else(|| {
            StorageError::Download {
                bucket: "test-bucket".to_string(),
                key: key.to_string(),
                source: "no such key".into(),
            }
        })?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, bytes).await?;
        Ok(())
    }
}

/// Finishes every job immediately with a fixed status.
///
/// The job id is the document key, and its blocks come from `blocks`
/// (no blocks for unknown keys).
pub struct InstantAnalysis {
    pub status: JobStatus,
    pub blocks: BTreeMap<String, Vec<Block>>,
    pub started: Mutex<Vec<String>>,
}

impl InstantAnalysis {
    pub fn new(status: JobStatus, blocks: Vec<(&str, Vec<Block>)>) -> Self {
        Self {
            status,
            blocks: blocks
                .into_iter()
                .map(|(key, blocks)| (key.to_string(), blocks))
                .collect(),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentAnalysis for InstantAnalysis {
    async fn start_table_analysis(&self, _bucket: &str, key: &str) -> Result<String, TextractError> {
        self.started.lock().unwrap().push(key.to_string());
        Ok(key.to_string())
    }

    async fn get_page(
        &self,
        job_id: &str,
        _next_token: Option<&str>,
    ) -> Result<AnalysisPage, TextractError> {
        Ok(AnalysisPage {
            status: self.status,
            blocks: self.blocks.get(job_id).cloned().unwrap_or_default(),
            next_token: None,
        })
    }
}

/// Word and cell blocks for a one-page table.
pub fn table_blocks(rows: &[&[&str]]) -> Vec<Block> {
    let mut blocks = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            let word_id = format!("w{r}_{c}");
            let row_index = u32::try_from(r + 1).unwrap();
            let column_index = u32::try_from(c + 1).unwrap();
            blocks.push(Block::word(&word_id, 1, text));
            blocks.push(Block::cell(
                &format!("c{r}_{c}"),
                1,
                row_index,
                column_index,
                &[word_id.as_str()],
            ));
        }
    }
    blocks
}
