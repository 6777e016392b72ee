#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Object storage for raw report PDFs and processed parquet files.
//!
//! Pipelines talk to storage through the [`ObjectStore`] trait so they can
//! run against an in-memory fake; [`S3Store`] is the AWS S3
//! implementation. Key layout helpers live in [`keys`].
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `HERD_KNOWLEDGE_BUCKET` | Yes | Bucket holding `raw/` and `processed/` |
//! | `AWS_REGION` | No | Region override for the S3 client |
//!
//! Credentials come from the standard AWS chain.

pub mod keys;

use std::path::Path;

use async_trait::async_trait;

/// Environment variable naming the bucket.
pub const BUCKET_ENV: &str = "HERD_KNOWLEDGE_BUCKET";

/// Errors that can occur during object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// S3 `GetObject` failed.
    #[error("Failed to download s3://{bucket}/{key}: {source}")]
    Download {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `PutObject` failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `HeadObject` failed for a reason other than `NotFound`.
    #[error("Failed to head s3://{bucket}/{key}: {source}")]
    Head {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `ListObjectsV2` failed.
    #[error("Failed to list s3://{bucket}/{prefix}: {source}")]
    List {
        /// Bucket name.
        bucket: String,
        /// Key prefix.
        prefix: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error reading or writing local files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bucket of objects addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, used when handing object locations to other services.
    fn bucket(&self) -> &str;

    /// Lists every key under a prefix (full keys, not stripped).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if listing fails.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Returns whether an object exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the check itself fails; a missing object
    /// is `Ok(false)`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Uploads a local file to `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be read or the upload
    /// fails.
    async fn upload(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;

    /// Downloads `key` to a local file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the download or the local write fails.
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;
}

/// AWS S3 implementation of [`ObjectStore`].
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Creates a store for `bucket`, optionally overriding the region.
    pub async fn new(bucket: String, region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_s3::Client::new(&config);

        Self { client, bucket }
    }

    /// Creates a store from `HERD_KNOWLEDGE_BUCKET` and `AWS_REGION`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingEnv`] if the bucket is not set.
    pub async fn from_env() -> Result<Self, StorageError> {
        let bucket = require_env(BUCKET_ENV)?;
        let region = std::env::var("AWS_REGION").ok();
        Ok(Self::new(bucket, region).await)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bucket = &self.bucket;
        log::info!("Listing s3://{bucket}/{prefix}*");

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(|e| StorageError::List {
                bucket: bucket.clone(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

            for obj in output.contents() {
                if let Some(key) = obj.key() {
                    keys.push(key.to_string());
                }
            }

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        log::info!("  found {} objects", keys.len());
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.as_service_error();
                if service_err
                    .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found)
                {
                    return Ok(false);
                }
                Err(StorageError::Head {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn upload(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let data = tokio::fs::read(local_path).await?;
        #[allow(clippy::cast_precision_loss)] // display-only MB value
        let mb = data.len() as f64 / 1_048_576.0;
        log::info!(
            "Pushing {} -> s3://{}/{key} ({mb:.1} MB)",
            local_path.display(),
            self.bucket
        );

        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("application/octet-stream")
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        log::info!("  uploaded {key}");
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        log::info!(
            "Pulling s3://{}/{key} -> {}",
            self.bucket,
            local_path.display()
        );

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Download {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        let bytes = output.body.collect().await.map_err(|e| StorageError::Download {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source: Box::new(e),
        })?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, bytes.into_bytes()).await?;

        Ok(())
    }
}

/// Reads a required environment variable.
fn require_env(name: &str) -> Result<String, StorageError> {
    std::env::var(name).map_err(|_| StorageError::MissingEnv {
        name: name.to_string(),
    })
}
