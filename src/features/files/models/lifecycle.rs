use thiserror::Error;

use crate::core::error::AppError;

/// Lifecycle state of a file record. Purged records no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Active,
    SoftDeleted,
    Purged,
}

impl FileState {
    pub fn from_marked_as_deleted(marked_as_deleted: bool) -> Self {
        if marked_as_deleted {
            FileState::SoftDeleted
        } else {
            FileState::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Caller soft-deletes the file
    Delete,
    /// Caller restores a soft-deleted file
    Restore,
    /// Retention sweeper removes the file for good
    Purge,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("File is already in the trash")]
    AlreadyDeleted,

    #[error("File is not in the trash")]
    NotDeleted,

    #[error("File has already been purged")]
    AlreadyPurged,
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> Self {
        AppError::Conflict(e.to_string())
    }
}

/// Next state for `event`, or the reason the transition is not defined
pub fn transition(from: FileState, event: LifecycleEvent) -> Result<FileState, LifecycleError> {
    match (from, event) {
        (FileState::Active, LifecycleEvent::Delete) => Ok(FileState::SoftDeleted),
        (FileState::SoftDeleted, LifecycleEvent::Restore) => Ok(FileState::Active),
        (FileState::SoftDeleted, LifecycleEvent::Purge) => Ok(FileState::Purged),
        (FileState::SoftDeleted, LifecycleEvent::Delete) => Err(LifecycleError::AlreadyDeleted),
        (FileState::Active, LifecycleEvent::Restore | LifecycleEvent::Purge) => {
            Err(LifecycleError::NotDeleted)
        }
        (FileState::Purged, _) => Err(LifecycleError::AlreadyPurged),
    }
}
