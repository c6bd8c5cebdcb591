//! MinIO/S3-compatible blob store
//!
//! Hands out presigned upload and download URLs and deletes objects.
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blob_store::{BlobStore, BlobStoreError, UploadTarget};
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    upload_prefix: String,
    presigned_url_expiry_secs: u32,
    upload_url_expiry_secs: u32,
    endpoint: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, upload_prefix: {}",
            config.endpoint,
            bucket.name(),
            config.upload_prefix
        );

        Ok(Self {
            bucket,
            region,
            credentials,
            upload_prefix: config.upload_prefix,
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
            upload_url_expiry_secs: config.upload_url_expiry_secs,
            endpoint: config.endpoint,
        })
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}' at {}: {}. Assuming it exists.",
                        self.bucket.name(),
                        self.endpoint,
                        e
                    );
                }
                Ok(())
            }
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Object key for a new upload: `{upload_prefix}/{uuid_v7}`
    fn new_blob_ref(&self) -> String {
        format!(
            "{}/{}",
            self.upload_prefix.trim_end_matches('/'),
            Uuid::now_v7()
        )
    }
}

fn is_missing_object(error: &s3::error::S3Error) -> bool {
    let error_str = error.to_string();
    error_str.contains("404") || error_str.contains("NoSuchKey")
}

#[async_trait]
impl BlobStore for MinIOClient {
    async fn generate_upload_url(&self) -> Result<UploadTarget, BlobStoreError> {
        let blob_ref = self.new_blob_ref();

        let upload_url = self
            .bucket
            .presign_put(&blob_ref, self.upload_url_expiry_secs, None, None)
            .await
            .map_err(|e| {
                BlobStoreError::Request(format!(
                    "Failed to presign upload for '{}': {}",
                    blob_ref, e
                ))
            })?;

        debug!("Presigned upload URL issued for '{}'", blob_ref);

        Ok(UploadTarget {
            upload_url,
            blob_ref,
        })
    }

    async fn get_url(&self, blob_ref: &str) -> Result<Option<String>, BlobStoreError> {
        match self.bucket.head_object(blob_ref).await {
            Ok((_, 404)) => return Ok(None),
            Ok((_, status)) if !(200..300).contains(&status) => {
                return Err(BlobStoreError::Status {
                    blob_ref: blob_ref.to_string(),
                    status,
                })
            }
            Ok(_) => {}
            Err(e) if is_missing_object(&e) => return Ok(None),
            Err(e) => {
                return Err(BlobStoreError::Request(format!(
                    "Failed to stat '{}': {}",
                    blob_ref, e
                )))
            }
        }

        let url = self
            .bucket
            .presign_get(blob_ref, self.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                BlobStoreError::Request(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    blob_ref, e
                ))
            })?;

        Ok(Some(url))
    }

    async fn delete(&self, blob_ref: &str) -> Result<(), BlobStoreError> {
        match self.bucket.delete_object(blob_ref).await {
            Ok(response) => {
                let status = response.status_code();
                if (200..300).contains(&status) || status == 404 {
                    debug!(
                        "Deleted blob '{}' from bucket '{}'",
                        blob_ref,
                        self.bucket.name()
                    );
                    Ok(())
                } else {
                    Err(BlobStoreError::Status {
                        blob_ref: blob_ref.to_string(),
                        status,
                    })
                }
            }
            Err(e) if is_missing_object(&e) => Ok(()),
            Err(e) => Err(BlobStoreError::Request(format!(
                "Failed to delete '{}': {}",
                blob_ref, e
            ))),
        }
    }
}
