//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by `ChallengeStore`.
///
/// Rejected mutations (duplicate member, counter out of range, ...) are not
/// errors; they come back as `Ok(false)`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChallengeStoreError {
    /// The persisted record exists but cannot be used. Raised at startup only;
    /// the file is left untouched.
    #[error("challenge record is corrupt: {0}")]
    CorruptState(String),
    /// Reading or writing the record failed. After a failed write the
    /// in-memory state is ahead of what is on disk.
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ChallengeStoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupt(reason) => Self::CorruptState(reason),
            other => Self::Storage(other),
        }
    }
}
