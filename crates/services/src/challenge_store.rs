use std::sync::Arc;

use challenge_core::model::{ChallengeError, ChallengeState, Goal, WinnerChange};
use storage::repository::StateRepository;
use tracing::{debug, info};

use crate::Clock;
use crate::error::ChallengeStoreError;
use crate::standings::{MemberStanding, WinnerEntry};

/// Owns the challenge and keeps the repository in sync with it.
///
/// Each mutating call applies one change to the in-memory state and, if the
/// change was accepted, writes the whole state back before returning.
/// Rejected changes return `Ok(false)` and write nothing.
///
/// Built once at startup and handed to callers by reference.
pub struct ChallengeStore {
    clock: Clock,
    repo: Arc<dyn StateRepository>,
    state: ChallengeState,
}

impl ChallengeStore {
    /// Load the stored challenge, or create and persist a fresh one if
    /// nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::CorruptState` if the stored record cannot
    /// be decoded. The record is never replaced in that case.
    /// Returns `ChallengeStoreError::Storage` on I/O failure.
    pub fn open(clock: Clock, repo: Arc<dyn StateRepository>) -> Result<Self, ChallengeStoreError> {
        if let Some(state) = repo.load()? {
            debug!(members = state.members().len(), goal = %state.total_goal(), "challenge loaded");
            return Ok(Self { clock, repo, state });
        }

        let state = ChallengeState::new(clock.now());
        repo.save(&state)?;
        info!("started a new challenge");
        Ok(Self { clock, repo, state })
    }

    #[must_use]
    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    /// Per-member progress in roster order.
    #[must_use]
    pub fn standings(&self) -> Vec<MemberStanding> {
        MemberStanding::collect(&self.state)
    }

    /// Winners in the order they reached the goal.
    #[must_use]
    pub fn winners(&self) -> Vec<WinnerEntry> {
        self.state
            .winners()
            .map(|(name, won_at)| WinnerEntry {
                name: name.clone(),
                won_at,
            })
            .collect()
    }

    /// Add a member with zero solved problems.
    ///
    /// Returns `Ok(false)` for an empty, whitespace-only or already-used name.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if persistence fails.
    pub fn add_member(&mut self, name: &str) -> Result<bool, ChallengeStoreError> {
        match self.state.add_member(name, self.clock.now()) {
            Ok(()) => {
                self.persist()?;
                info!(member = name, "member added");
                Ok(true)
            }
            Err(err) => Ok(rejected("add_member", &err)),
        }
    }

    /// Remove a member, their progress and any winner entry.
    ///
    /// Returns `Ok(false)` if the member is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if persistence fails.
    pub fn remove_member(&mut self, name: &str) -> Result<bool, ChallengeStoreError> {
        match self.state.remove_member(name) {
            Ok(()) => {
                self.persist()?;
                info!(member = name, "member removed");
                Ok(true)
            }
            Err(err) => Ok(rejected("remove_member", &err)),
        }
    }

    /// Record one solved problem for `name`.
    ///
    /// Returns `Ok(false)` if the member is unknown or already at the goal.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if persistence fails.
    pub fn increment_problems(&mut self, name: &str) -> Result<bool, ChallengeStoreError> {
        match self.state.increment(name, self.clock.now()) {
            Ok(change) => {
                self.persist()?;
                debug!(member = name, count = change.count, "problem recorded");
                log_winner_change(name, change.winner);
                Ok(true)
            }
            Err(err) => Ok(rejected("increment_problems", &err)),
        }
    }

    /// Take back one solved problem for `name`.
    ///
    /// Returns `Ok(false)` if the member is unknown or has nothing solved.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if persistence fails.
    pub fn decrement_problems(&mut self, name: &str) -> Result<bool, ChallengeStoreError> {
        match self.state.decrement(name) {
            Ok(change) => {
                self.persist()?;
                debug!(member = name, count = change.count, "problem taken back");
                log_winner_change(name, change.winner);
                Ok(true)
            }
            Err(err) => Ok(rejected("decrement_problems", &err)),
        }
    }

    /// Set the goal, clamping anything below 1 up to 1. Always persists.
    ///
    /// Existing winners are kept and nobody is newly crowned: winner status
    /// only changes on the next increment or decrement.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if persistence fails.
    pub fn set_total_goal(&mut self, requested: i64) -> Result<Goal, ChallengeStoreError> {
        let goal = self.state.set_total_goal(requested);
        self.persist()?;
        info!(requested, goal = %goal, "goal updated");
        Ok(goal)
    }

    /// Drop the stored record and start over with a default challenge.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeStoreError::Storage` if the record cannot be removed
    /// or the new one cannot be written.
    pub fn reset_challenge(&mut self) -> Result<(), ChallengeStoreError> {
        self.repo.clear()?;
        self.state = ChallengeState::new(self.clock.now());
        self.persist()?;
        info!("challenge reset");
        Ok(())
    }

    fn persist(&self) -> Result<(), ChallengeStoreError> {
        self.repo.save(&self.state)?;
        Ok(())
    }
}

fn rejected(operation: &'static str, err: &ChallengeError) -> bool {
    debug!(operation, reason = %err, "change rejected");
    false
}

fn log_winner_change(name: &str, change: WinnerChange) {
    match change {
        WinnerChange::Crowned(at) => info!(member = name, won_at = %at, "goal reached"),
        WinnerChange::Revoked => info!(member = name, "winner status revoked"),
        WinnerChange::Unchanged => {}
    }
}
