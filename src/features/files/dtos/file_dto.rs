use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::files::models::{File, FileType};
use crate::modules::storage::UploadTarget;
use crate::shared::constants::{MAX_FILE_NAME_LENGTH, MAX_ORG_ID_LENGTH};
use crate::shared::validation::{BLOB_REF_REGEX, ORG_ID_REGEX};

/// Request DTO for registering an uploaded blob as a file
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFileDto {
    /// Display name shown in the file browser
    #[validate(length(
        min = 1,
        max = MAX_FILE_NAME_LENGTH,
        message = "Name must be 1-200 characters"
    ))]
    #[schema(example = "quarterly-report.pdf")]
    pub name: String,

    /// Blob reference returned by the upload-url endpoint
    #[validate(regex(path = *BLOB_REF_REGEX, message = "Invalid blob reference"))]
    pub blob_ref: String,

    /// Organization (or personal workspace) the file belongs to
    #[validate(
        length(min = 1, max = MAX_ORG_ID_LENGTH, message = "Organization id must be 1-128 characters"),
        regex(path = *ORG_ID_REGEX, message = "Invalid organization id")
    )]
    pub org_id: String,

    /// File class; takes precedence over `content_type`
    #[serde(rename = "type", default)]
    pub file_type: Option<FileType>,

    /// MIME type reported by the client, used when `type` is absent
    #[schema(example = "application/pdf")]
    pub content_type: Option<String>,
}

impl CreateFileDto {
    /// Explicit `type`, else the class of `content_type`
    pub fn resolve_file_type(&self) -> Option<FileType> {
        self.file_type
            .or_else(|| self.content_type.as_deref().and_then(FileType::from_mime))
    }
}

/// Query parameters for listing an organization's files
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Case-insensitive substring match on the file name
    pub query: Option<String>,

    /// Only files of this type
    #[serde(rename = "type")]
    pub file_type: Option<FileType>,

    /// Only files the caller has favorited
    #[serde(default)]
    pub favorites: bool,

    /// Only files in the trash instead of active files
    #[serde(default)]
    pub trash: bool,
}

/// Response DTO for listed files
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub org_id: String,
    /// Uploading user
    pub user_id: Uuid,
    /// Read URL, null when the blob cannot be resolved
    pub url: Option<String>,
    /// Whether the caller has favorited this file in the org
    pub is_favorited: bool,
    pub marked_as_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl FileResponseDto {
    pub fn from_file(file: File, url: Option<String>, is_favorited: bool) -> Self {
        Self {
            id: file.id,
            name: file.name,
            file_type: file.file_type,
            org_id: file.org_id,
            user_id: file.user_id,
            url,
            is_favorited,
            marked_as_deleted: file.marked_as_deleted,
            created_at: file.created_at,
        }
    }
}

/// Response DTO after a delete or restore
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileStateResponseDto {
    pub id: Uuid,
    pub marked_as_deleted: bool,
}

impl From<&File> for FileStateResponseDto {
    fn from(file: &File) -> Self {
        Self {
            id: file.id,
            marked_as_deleted: file.marked_as_deleted,
        }
    }
}

/// Presigned upload target
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponseDto {
    /// URL to PUT the file bytes to
    pub upload_url: String,
    /// Reference to send back in the create-file request
    pub blob_ref: String,
}

impl From<UploadTarget> for UploadUrlResponseDto {
    fn from(target: UploadTarget) -> Self {
        Self {
            upload_url: target.upload_url,
            blob_ref: target.blob_ref,
        }
    }
}
