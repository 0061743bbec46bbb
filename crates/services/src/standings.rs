use chrono::{DateTime, Utc};

use challenge_core::color::{Rgb, progress_color};
use challenge_core::model::{ChallengeState, MemberName};

/// One member's row as the UI shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberStanding {
    pub name: MemberName,
    pub solved: u32,
    pub goal: u32,
    /// `solved / goal`, capped at 1.0 for members above a lowered goal.
    pub ratio: f64,
    pub color: Rgb,
    pub won_at: Option<DateTime<Utc>>,
}

impl MemberStanding {
    pub(crate) fn collect(state: &ChallengeState) -> Vec<Self> {
        let goal = state.total_goal().value();
        state
            .members()
            .iter()
            .map(|name| {
                let solved = state.count(name.as_str()).unwrap_or(0);
                let ratio = (f64::from(solved) / f64::from(goal)).min(1.0);
                Self {
                    name: name.clone(),
                    solved,
                    goal,
                    ratio,
                    color: progress_color(ratio),
                    won_at: state.won_at(name.as_str()),
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_winner(&self) -> bool {
        self.won_at.is_some()
    }
}

/// A winner and when they reached the goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerEntry {
    pub name: MemberName,
    pub won_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use challenge_core::time::fixed_now;

    #[test]
    fn standings_follow_roster_order_and_ratio() {
        let mut state = ChallengeState::new(fixed_now());
        state.add_member("Bob", fixed_now()).unwrap();
        state.add_member("Alice", fixed_now()).unwrap();
        state.set_total_goal(4);
        state.increment("Alice", fixed_now()).unwrap();

        let rows = MemberStanding::collect(&state);
        assert_eq!(rows[0].name.as_str(), "Bob");
        assert_eq!(rows[0].solved, 0);
        assert_eq!(rows[0].color.to_string(), "#ff0000");
        assert_eq!(rows[1].solved, 1);
        assert!((rows[1].ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(rows[1].goal, 4);
        assert!(!rows[1].is_winner());
    }

    #[test]
    fn ratio_is_capped_after_goal_is_lowered() {
        let mut state = ChallengeState::new(fixed_now());
        state.add_member("Alice", fixed_now()).unwrap();
        state.set_total_goal(6);
        for _ in 0..6 {
            state.increment("Alice", fixed_now()).unwrap();
        }
        state.set_total_goal(2);

        let rows = MemberStanding::collect(&state);
        assert!((rows[0].ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].color.to_string(), "#00ff00");
        assert!(rows[0].is_winner());
    }
}
