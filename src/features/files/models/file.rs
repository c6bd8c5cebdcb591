use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use super::FileState;

/// MIME class of a stored file, matching the `file_type` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Csv,
    Txt,
    Pdf,
}

impl FileType {
    /// Classify a MIME type; `None` for anything outside the supported classes
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => Some(FileType::Pdf),
            "text/csv" => Some(FileType::Csv),
            "text/plain" => Some(FileType::Txt),
            other if other.starts_with("image/") => Some(FileType::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Image => write!(f, "image"),
            FileType::Csv => write!(f, "csv"),
            FileType::Txt => write!(f, "txt"),
            FileType::Pdf => write!(f, "pdf"),
        }
    }
}

/// Database model for files
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: Uuid,
    pub name: String,
    pub file_type: FileType,
    pub org_id: String,
    pub user_id: Uuid,
    pub blob_ref: String,
    pub marked_as_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl File {
    pub fn state(&self) -> FileState {
        FileState::from_marked_as_deleted(self.marked_as_deleted)
    }
}

/// Data for creating a new file record
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub file_type: FileType,
    pub org_id: String,
    pub user_id: Uuid,
    pub blob_ref: String,
}
