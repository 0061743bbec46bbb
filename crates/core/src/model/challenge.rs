use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::goal::Goal;
use crate::model::member::{MemberError, MemberName, MemberProgress};
use crate::timestamp;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Why a mutation was not applied. None of these leave the state changed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChallengeError {
    #[error(transparent)]
    InvalidName(#[from] MemberError),

    #[error("member already exists: {0}")]
    DuplicateMember(String),

    #[error("unknown member: {0}")]
    UnknownMember(String),

    #[error("{name} already reached the goal of {goal}")]
    GoalReached { name: String, goal: u32 },

    #[error("{0} has no solved problems to remove")]
    NothingSolved(String),
}

/// Structural problems found in a loaded record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntegrityError {
    #[error("member listed twice: {0}")]
    DuplicateMember(String),

    #[error("member has no progress entry: {0}")]
    MissingProgress(String),

    #[error("progress entry for unlisted member: {0}")]
    OrphanProgress(String),
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Effect of a counter change on the member's winner status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerChange {
    Unchanged,
    Crowned(DateTime<Utc>),
    Revoked,
}

/// Result of a successful increment or decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountChange {
    pub count: u32,
    pub winner: WinnerChange,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// The whole challenge: roster, counters, goal and winners.
///
/// Every mutation either applies completely or returns a `ChallengeError`
/// without touching anything. Winner status is evaluated only when a counter
/// moves; changing the goal never adds or removes winners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    members: Vec<MemberName>,
    #[serde(alias = "problems_solved")]
    progress: IndexMap<MemberName, MemberProgress>,
    #[serde(alias = "total_problems")]
    total_goal: Goal,
    #[serde(alias = "start_date", with = "timestamp")]
    start_date: DateTime<Utc>,
    #[serde(with = "timestamp::map")]
    winners: IndexMap<MemberName, DateTime<Utc>>,
}

impl ChallengeState {
    /// An empty challenge with the default goal, started at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            members: Vec::new(),
            progress: IndexMap::new(),
            total_goal: Goal::DEFAULT,
            start_date: now,
            winners: IndexMap::new(),
        }
    }

    /// Checks that the roster and the progress table describe the same members.
    ///
    /// # Errors
    ///
    /// Returns the first `IntegrityError` found.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let mut seen = HashSet::with_capacity(self.members.len());
        for name in &self.members {
            if !seen.insert(name.as_str()) {
                return Err(IntegrityError::DuplicateMember(name.to_string()));
            }
            if !self.progress.contains_key(name) {
                return Err(IntegrityError::MissingProgress(name.to_string()));
            }
        }
        if let Some(orphan) = self.progress.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(IntegrityError::OrphanProgress(orphan.to_string()));
        }
        Ok(())
    }

    /// Drops winner entries for names that are no longer on the roster and
    /// returns them.
    ///
    /// Older trackers kept a member's winner entry after removing them; left
    /// in place, re-adding that name would show a winner with nothing solved.
    pub fn prune_stale_winners(&mut self) -> Vec<MemberName> {
        let (kept, stale): (IndexMap<_, _>, IndexMap<_, _>) = std::mem::take(&mut self.winners)
            .into_iter()
            .partition(|(name, _)| self.progress.contains_key(name));
        self.winners = kept;
        stale.into_keys().collect()
    }

    // Accessors
    #[must_use]
    pub fn members(&self) -> &[MemberName] {
        &self.members
    }

    #[must_use]
    pub fn progress(&self, name: &str) -> Option<&MemberProgress> {
        self.progress.get(name)
    }

    #[must_use]
    pub fn count(&self, name: &str) -> Option<u32> {
        self.progress(name).map(MemberProgress::count)
    }

    #[must_use]
    pub fn total_goal(&self) -> Goal {
        self.total_goal
    }

    #[must_use]
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Winners with their win time, in the order they won.
    pub fn winners(&self) -> impl Iterator<Item = (&MemberName, DateTime<Utc>)> {
        self.winners.iter().map(|(name, at)| (name, *at))
    }

    #[must_use]
    pub fn won_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.winners.get(name).copied()
    }

    #[must_use]
    pub fn is_winner(&self, name: &str) -> bool {
        self.winners.contains_key(name)
    }

    #[must_use]
    pub fn is_member(&self, name: &str) -> bool {
        self.progress.contains_key(name)
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Adds a member with zero solved problems.
    ///
    /// # Errors
    ///
    /// `InvalidName` for empty or whitespace-only names, `DuplicateMember` if
    /// already present.
    pub fn add_member(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        let name = MemberName::for_new_member(name)?;
        if self.is_member(name.as_str()) {
            return Err(ChallengeError::DuplicateMember(name.into()));
        }
        self.progress.insert(name.clone(), MemberProgress::new(now));
        self.members.push(name);
        Ok(())
    }

    /// Removes a member and their progress. Any winner entry is dropped too.
    ///
    /// # Errors
    ///
    /// `UnknownMember` if the name is not on the roster.
    pub fn remove_member(&mut self, name: &str) -> Result<(), ChallengeError> {
        let Some(index) = self.members.iter().position(|m| m.as_str() == name) else {
            return Err(ChallengeError::UnknownMember(name.to_owned()));
        };
        self.members.remove(index);
        self.progress.shift_remove(name);
        self.winners.shift_remove(name);
        Ok(())
    }

    /// Records one more solved problem. Reaching the goal exactly makes the
    /// member a winner as of `now`.
    ///
    /// # Errors
    ///
    /// `UnknownMember`, or `GoalReached` when the count is already at or above
    /// the goal.
    pub fn increment(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<CountChange, ChallengeError> {
        let goal = self.total_goal.value();
        let (_, key, progress) = self
            .progress
            .get_full_mut(name)
            .ok_or_else(|| ChallengeError::UnknownMember(name.to_owned()))?;
        if progress.count() >= goal {
            return Err(ChallengeError::GoalReached {
                name: name.to_owned(),
                goal,
            });
        }

        let count = progress.count() + 1;
        progress.set_count(count);

        let winner = if count == goal {
            self.winners.insert(key.clone(), now);
            WinnerChange::Crowned(now)
        } else {
            WinnerChange::Unchanged
        };
        Ok(CountChange { count, winner })
    }

    /// Takes back one solved problem. A winner who drops below the goal loses
    /// winner status.
    ///
    /// # Errors
    ///
    /// `UnknownMember`, or `NothingSolved` when the count is already zero.
    pub fn decrement(&mut self, name: &str) -> Result<CountChange, ChallengeError> {
        let goal = self.total_goal.value();
        let progress = self
            .progress
            .get_mut(name)
            .ok_or_else(|| ChallengeError::UnknownMember(name.to_owned()))?;
        if progress.count() == 0 {
            return Err(ChallengeError::NothingSolved(name.to_owned()));
        }

        let count = progress.count() - 1;
        progress.set_count(count);

        let winner = if count < goal && self.winners.shift_remove(name).is_some() {
            WinnerChange::Revoked
        } else {
            WinnerChange::Unchanged
        };
        Ok(CountChange { count, winner })
    }

    /// Replaces the goal with `requested` clamped to at least 1 and returns
    /// the stored value. Counts and winners are left exactly as they were.
    pub fn set_total_goal(&mut self, requested: i64) -> Goal {
        self.total_goal = Goal::clamped(requested);
        self.total_goal
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_clock, fixed_now};
    use chrono::Duration;

    fn state_with(names: &[&str]) -> ChallengeState {
        let mut state = ChallengeState::new(fixed_now());
        for name in names {
            state.add_member(name, fixed_now()).unwrap();
        }
        state
    }

    #[test]
    fn new_state_is_empty_with_default_goal() {
        let state = ChallengeState::new(fixed_now());
        assert!(state.members().is_empty());
        assert_eq!(state.winners().count(), 0);
        assert_eq!(state.total_goal().value(), 50);
        assert_eq!(state.start_date(), fixed_now());
    }

    #[test]
    fn add_member_appends_in_order() {
        let state = state_with(&["Alice", "Bob", "Carol"]);
        let names: Vec<&str> = state.members().iter().map(MemberName::as_str).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(state.count("Bob"), Some(0));
        assert_eq!(state.progress("Bob").unwrap().join_date(), fixed_now());
    }

    #[test]
    fn add_member_rejects_duplicates_and_empty() {
        let mut state = state_with(&["Alice"]);
        assert_eq!(
            state.add_member("Alice", fixed_now()),
            Err(ChallengeError::DuplicateMember("Alice".into()))
        );
        assert_eq!(
            state.add_member("", fixed_now()),
            Err(ChallengeError::InvalidName(MemberError::EmptyName))
        );
        assert_eq!(
            state.add_member(" \t", fixed_now()),
            Err(ChallengeError::InvalidName(MemberError::BlankName))
        );
        assert_eq!(state.members().len(), 1);
    }

    #[test]
    fn remove_member_unknown_is_rejected() {
        let mut state = state_with(&["Alice"]);
        assert_eq!(
            state.remove_member("Bob"),
            Err(ChallengeError::UnknownMember("Bob".into()))
        );
        assert_eq!(state.members().len(), 1);
    }

    #[test]
    fn add_then_remove_restores_state() {
        let mut state = state_with(&["Alice", "Bob"]);
        state.set_total_goal(1);
        state.increment("Alice", fixed_now()).unwrap();
        let before = state.clone();

        state.add_member("Carol", fixed_now()).unwrap();
        state.increment("Carol", fixed_now()).unwrap();
        assert!(state.is_winner("Carol"));
        state.remove_member("Carol").unwrap();

        assert_eq!(state, before);
        state.check_integrity().unwrap();
    }

    #[test]
    fn removing_a_winner_purges_winner_entry() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(1);
        state.increment("Alice", fixed_now()).unwrap();
        state.remove_member("Alice").unwrap();
        assert!(!state.is_winner("Alice"));
        assert_eq!(state.winners().count(), 0);
    }

    #[test]
    fn increment_stops_at_goal() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(3);
        for _ in 0..3 {
            state.increment("Alice", fixed_now()).unwrap();
        }
        assert_eq!(
            state.increment("Alice", fixed_now()),
            Err(ChallengeError::GoalReached {
                name: "Alice".into(),
                goal: 3
            })
        );
        assert_eq!(state.count("Alice"), Some(3));
    }

    #[test]
    fn decrement_stops_at_zero() {
        let mut state = state_with(&["Alice"]);
        assert_eq!(
            state.decrement("Alice"),
            Err(ChallengeError::NothingSolved("Alice".into()))
        );
        assert_eq!(state.count("Alice"), Some(0));
    }

    #[test]
    fn counters_reject_unknown_members() {
        let mut state = state_with(&["Alice"]);
        assert!(matches!(
            state.increment("Zed", fixed_now()),
            Err(ChallengeError::UnknownMember(_))
        ));
        assert!(matches!(
            state.decrement("Zed"),
            Err(ChallengeError::UnknownMember(_))
        ));
    }

    #[test]
    fn increment_then_decrement_is_identity_inside_bounds() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(5);
        state.increment("Alice", fixed_now()).unwrap();
        state.increment("Alice", fixed_now()).unwrap();
        let before = state.clone();

        state.increment("Alice", fixed_now()).unwrap();
        state.decrement("Alice").unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn crowned_exactly_when_goal_is_reached() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(2);
        let won_at = fixed_now() + Duration::hours(3);

        let first = state.increment("Alice", fixed_now()).unwrap();
        assert_eq!(first.winner, WinnerChange::Unchanged);
        assert!(!state.is_winner("Alice"));

        let second = state.increment("Alice", won_at).unwrap();
        assert_eq!(second, CountChange { count: 2, winner: WinnerChange::Crowned(won_at) });
        assert_eq!(state.won_at("Alice"), Some(won_at));
    }

    #[test]
    fn revoked_when_winner_drops_below_goal() {
        let mut state = state_with(&["Alice", "Bob"]);
        state.set_total_goal(2);
        state.increment("Alice", fixed_now()).unwrap();
        state.increment("Alice", fixed_now()).unwrap();

        let change = state.decrement("Alice").unwrap();
        assert_eq!(change, CountChange { count: 1, winner: WinnerChange::Revoked });
        assert!(!state.is_winner("Alice"));
        assert_eq!(state.count("Alice"), Some(1));
    }

    #[test]
    fn winners_keep_the_order_they_won_in() {
        let mut state = state_with(&["Alice", "Bob"]);
        state.set_total_goal(1);
        state.increment("Bob", fixed_now()).unwrap();
        state.increment("Alice", fixed_now()).unwrap();
        let order: Vec<&str> = state.winners().map(|(name, _)| name.as_str()).collect();
        assert_eq!(order, ["Bob", "Alice"]);
    }

    #[test]
    fn each_winner_keeps_their_own_win_time() {
        let mut clock = fixed_clock();
        let mut state = ChallengeState::new(clock.now());
        state.add_member("Alice", clock.now()).unwrap();
        state.add_member("Bob", clock.now()).unwrap();
        state.set_total_goal(1);

        clock.advance(Duration::hours(1));
        state.increment("Alice", clock.now()).unwrap();
        clock.advance(Duration::minutes(30));
        state.increment("Bob", clock.now()).unwrap();

        assert_eq!(state.won_at("Alice"), Some(fixed_now() + Duration::hours(1)));
        assert_eq!(
            state.won_at("Bob"),
            Some(fixed_now() + Duration::minutes(90))
        );
        assert_eq!(state.start_date(), fixed_now());
    }

    #[test]
    fn set_total_goal_clamps() {
        let mut state = state_with(&[]);
        assert_eq!(state.set_total_goal(0).value(), 1);
        assert_eq!(state.set_total_goal(-5).value(), 1);
        assert_eq!(state.set_total_goal(20).value(), 20);
        assert_eq!(state.total_goal().value(), 20);
    }

    #[test]
    fn lowering_goal_does_not_crown_existing_counts() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(10);
        for _ in 0..4 {
            state.increment("Alice", fixed_now()).unwrap();
        }
        state.set_total_goal(3);
        assert!(!state.is_winner("Alice"));
        assert_eq!(state.count("Alice"), Some(4));
        // Above the goal now, so increments are refused.
        assert!(state.increment("Alice", fixed_now()).is_err());
    }

    #[test]
    fn raising_goal_does_not_revoke_existing_winners() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(2);
        state.increment("Alice", fixed_now()).unwrap();
        state.increment("Alice", fixed_now()).unwrap();
        state.set_total_goal(10);
        assert!(state.is_winner("Alice"));

        // The next decrement re-evaluates and revokes.
        let change = state.decrement("Alice").unwrap();
        assert_eq!(change.winner, WinnerChange::Revoked);
    }

    #[test]
    fn decrement_above_lowered_goal_keeps_non_winner_out() {
        let mut state = state_with(&["Alice"]);
        state.set_total_goal(10);
        for _ in 0..5 {
            state.increment("Alice", fixed_now()).unwrap();
        }
        state.set_total_goal(2);
        let change = state.decrement("Alice").unwrap();
        assert_eq!(change, CountChange { count: 4, winner: WinnerChange::Unchanged });
        assert!(!state.is_winner("Alice"));
    }

    #[test]
    fn serde_round_trip_is_exact() {
        let mut state = state_with(&["Alice", "Bob"]);
        state.set_total_goal(2);
        let won_at = fixed_now() + Duration::milliseconds(1_234);
        state.increment("Alice", fixed_now()).unwrap();
        state.increment("Alice", won_at).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: ChallengeState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.won_at("Alice"), Some(won_at));
    }

    #[test]
    fn serializes_canonical_field_names() {
        let state = state_with(&["Alice"]);
        let value = serde_json::to_value(&state).unwrap();
        let object = value.as_object().unwrap();
        for key in ["members", "progress", "totalGoal", "startDate", "winners"] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(value["progress"]["Alice"]["count"], 0);
        assert_eq!(value["progress"]["Alice"]["joinDate"], "2024-01-01T09:00:00Z");
        assert_eq!(value["startDate"], "2024-01-01T09:00:00Z");
    }

    #[test]
    fn missing_keys_fail_to_parse() {
        let raw = r#"{"members": [], "progress": {}, "startDate": "2024-01-01T09:00:00Z", "winners": {}}"#;
        assert!(serde_json::from_str::<ChallengeState>(raw).is_err());
    }

    #[test]
    fn integrity_catches_orphans_and_gaps() {
        let orphan = r#"{"members": [], "progress": {"Ghost": {"count": 1, "joinDate": "2024-01-01T09:00:00Z"}},
            "totalGoal": 5, "startDate": "2024-01-01T09:00:00Z", "winners": {}}"#;
        let state: ChallengeState = serde_json::from_str(orphan).unwrap();
        assert_eq!(
            state.check_integrity(),
            Err(IntegrityError::OrphanProgress("Ghost".into()))
        );

        let gap = r#"{"members": ["Alice"], "progress": {},
            "totalGoal": 5, "startDate": "2024-01-01T09:00:00Z", "winners": {}}"#;
        let state: ChallengeState = serde_json::from_str(gap).unwrap();
        assert_eq!(
            state.check_integrity(),
            Err(IntegrityError::MissingProgress("Alice".into()))
        );

        let twice = r#"{"members": ["Alice", "Alice"], "progress": {"Alice": {"count": 0, "joinDate": "2024-01-01T09:00:00Z"}},
            "totalGoal": 5, "startDate": "2024-01-01T09:00:00Z", "winners": {}}"#;
        let state: ChallengeState = serde_json::from_str(twice).unwrap();
        assert_eq!(
            state.check_integrity(),
            Err(IntegrityError::DuplicateMember("Alice".into()))
        );
    }

    #[test]
    fn stale_winners_are_pruned() {
        let raw = r#"{"members": ["Bob"], "progress": {"Bob": {"count": 1, "joinDate": "2024-01-01T09:00:00Z"}},
            "totalGoal": 1, "startDate": "2024-01-01T09:00:00Z",
            "winners": {"Alice": "2024-01-02T09:00:00Z", "Bob": "2024-01-03T09:00:00Z"}}"#;
        let mut state: ChallengeState = serde_json::from_str(raw).unwrap();
        state.check_integrity().unwrap();

        let pruned = state.prune_stale_winners();
        assert_eq!(pruned, [MemberName::new("Alice").unwrap()]);
        assert!(!state.is_winner("Alice"));
        assert!(state.is_winner("Bob"));

        state.add_member("Alice", fixed_now()).unwrap();
        assert!(!state.is_winner("Alice"));
        assert_eq!(state.count("Alice"), Some(0));
        assert!(state.prune_stale_winners().is_empty());
    }

    #[test]
    fn blank_names_from_older_records_still_load() {
        let raw = r#"{"members": [" "], "progress": {" ": {"count": 2, "joinDate": "2024-01-01T09:00:00Z"}},
            "totalGoal": 5, "startDate": "2024-01-01T09:00:00Z", "winners": {}}"#;
        let mut state: ChallengeState = serde_json::from_str(raw).unwrap();
        state.check_integrity().unwrap();
        assert_eq!(state.count(" "), Some(2));
        state.increment(" ", fixed_now()).unwrap();
        state.remove_member(" ").unwrap();
        assert!(state.members().is_empty());
    }
}
