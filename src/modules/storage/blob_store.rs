use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::error::AppError;

/// Presigned target for a direct client upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    /// URL the client sends the file bytes to
    pub upload_url: String,
    /// Reference to pass back when registering the file
    pub blob_ref: String,
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Blob storage request failed: {0}")]
    Request(String),

    #[error("Blob storage returned HTTP {status} for '{blob_ref}'")]
    Status { blob_ref: String, status: u16 },
}

impl From<BlobStoreError> for AppError {
    fn from(e: BlobStoreError) -> Self {
        AppError::ExternalServiceError(e.to_string())
    }
}

/// External blob storage holding file bytes.
///
/// File records only ever carry the opaque `blob_ref`; bytes never pass through
/// this service.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reserve a fresh blob reference and a short-lived upload URL for it
    async fn generate_upload_url(&self) -> Result<UploadTarget, BlobStoreError>;

    /// Read URL for a blob, or `None` when the blob does not exist
    async fn get_url(&self, blob_ref: &str) -> Result<Option<String>, BlobStoreError>;

    /// Delete a blob. Deleting a missing blob succeeds.
    async fn delete(&self, blob_ref: &str) -> Result<(), BlobStoreError>;
}
