//! Storage module for file blobs
//!
//! Defines the `BlobStore` seam and its MinIO/S3-compatible implementation.

pub mod blob_store;
mod minio_client;

pub use blob_store::{BlobStore, UploadTarget};
pub use minio_client::MinIOClient;
