use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use challenge_core::model::ChallengeState;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::repository::{StateRepository, Storage, StorageError};

/// File name used when no path is configured.
pub const DEFAULT_FILE_NAME: &str = "leetcode_challenge_data.json";

const INDENT: &[u8] = b"    ";

/// Stores the challenge as one pretty-printed JSON document.
///
/// Saves write a sibling temp file and rename it over the target, so readers
/// see either the previous record or the new one. There is no locking: two
/// processes saving at once will each overwrite the other's record.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StateRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<ChallengeState>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no challenge record yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let state = decode(&bytes)?;
        debug!(
            path = %self.path.display(),
            members = state.members().len(),
            "loaded challenge record"
        );
        Ok(Some(state))
    }

    fn save(&self, state: &ChallengeState) -> Result<(), StorageError> {
        let bytes = encode(state)?;
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "saved challenge record");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed challenge record");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file at `path`.
    #[must_use]
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(JsonFileRepository::new(path)),
        }
    }
}

/// Serialize a record in its on-disk form (four-space indent, trailing newline).
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(state: &ChallengeState) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    state
        .serialize(&mut ser)
        .map_err(|err| StorageError::Serialization(err.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse an on-disk record and check that its roster is consistent.
///
/// Both the canonical camelCase keys and the snake_case keys of older
/// trackers are accepted. Unknown keys are ignored, and winner entries left
/// behind for members that are no longer listed are dropped.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` for malformed JSON, missing or mistyped
/// fields, or a roster that disagrees with the progress table.
pub fn decode(bytes: &[u8]) -> Result<ChallengeState, StorageError> {
    let mut state: ChallengeState =
        serde_json::from_slice(bytes).map_err(|err| StorageError::Corrupt(err.to_string()))?;
    state
        .check_integrity()
        .map_err(|err| StorageError::Corrupt(err.to_string()))?;
    for name in state.prune_stale_winners() {
        debug!(member = %name, "dropped winner entry for unlisted member");
    }
    Ok(state)
}
