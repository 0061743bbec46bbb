mod challenge;
mod goal;
mod member;

pub use challenge::{ChallengeError, ChallengeState, CountChange, IntegrityError, WinnerChange};
pub use goal::{Goal, ZeroGoalError};
pub use member::{MemberError, MemberName, MemberProgress};
