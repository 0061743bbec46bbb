use std::sync::{Arc, Mutex};

use challenge_core::model::ChallengeState;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The stored record exists but cannot be read back as a challenge.
    #[error("corrupt challenge record: {0}")]
    Corrupt(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the in-memory record.
    #[error("repository lock poisoned: {0}")]
    Poisoned(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence contract for the single challenge record.
///
/// Every `save` replaces the whole record; there are no partial updates.
pub trait StateRepository: Send + Sync {
    /// Read the stored record, or `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if a record exists but cannot be
    /// decoded, or other storage errors.
    fn load(&self) -> Result<Option<ChallengeState>, StorageError>;

    /// Replace the stored record with `state`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    fn save(&self, state: &ChallengeState) -> Result<(), StorageError>;

    /// Discard the stored record. Clearing an empty repository is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record exists but cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory repository for tests and throwaway sessions.
///
/// Clones share the same record, so a test can keep a handle and inspect
/// what a service persisted.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    record: Arc<Mutex<Option<ChallengeState>>>,
    saves: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository that already holds `state`.
    #[must_use]
    pub fn with_state(state: ChallengeState) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(state))),
            saves: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of successful `save` calls so far.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.saves.lock().map_or(0, |guard| *guard)
    }

    /// Snapshot of the stored record.
    #[must_use]
    pub fn stored(&self) -> Option<ChallengeState> {
        self.record.lock().ok().and_then(|guard| guard.clone())
    }
}

impl StateRepository for InMemoryRepository {
    fn load(&self) -> Result<Option<ChallengeState>, StorageError> {
        let guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &ChallengeState) -> Result<(), StorageError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *guard = Some(state.clone());
        let mut saves = self
            .saves
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *saves += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Holds the active repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub state: Arc<dyn StateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(InMemoryRepository::new()),
        }
    }
}
