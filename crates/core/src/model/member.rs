use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MemberError {
    #[error("member name cannot be empty")]
    EmptyName,

    #[error("member name cannot be only whitespace")]
    BlankName,
}

//
// ─── NAME ──────────────────────────────────────────────────────────────────────
//

/// Display name identifying a member.
///
/// Names are compared exactly (case-sensitive, no trimming). Any non-empty
/// string is a valid stored name; joining the challenge additionally
/// refuses whitespace-only names (see [`MemberName::for_new_member`]).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberName(String);

impl MemberName {
    /// Wraps a stored member name.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::EmptyName` if the name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, MemberError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MemberError::EmptyName);
        }
        Ok(Self(name))
    }

    /// Validates a name for someone joining the challenge.
    ///
    /// Stricter than [`MemberName::new`]: records written by older trackers
    /// may hold whitespace-only names and still load, but new members cannot
    /// be added under one.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::EmptyName` or `MemberError::BlankName`.
    pub fn for_new_member(name: impl Into<String>) -> Result<Self, MemberError> {
        let name = Self::new(name)?;
        if name.0.trim().is_empty() {
            return Err(MemberError::BlankName);
        }
        Ok(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberName {
    type Error = MemberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberName> for String {
    fn from(value: MemberName) -> Self {
        value.0
    }
}

impl Borrow<str> for MemberName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MemberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberName({:?})", self.0)
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Solved-problem counter for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    count: u32,
    #[serde(alias = "join_date", with = "timestamp")]
    join_date: DateTime<Utc>,
}

impl MemberProgress {
    /// Fresh progress for a member joining at `joined_at`.
    #[must_use]
    pub fn new(joined_at: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            join_date: joined_at,
        }
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn join_date(&self) -> DateTime<Utc> {
        self.join_date
    }

    pub(crate) fn set_count(&mut self, count: u32) {
        self.count = count;
    }
}
