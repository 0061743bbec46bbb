#![forbid(unsafe_code)]

pub mod challenge_store;
pub mod error;
pub mod standings;

pub use challenge_core::Clock;

pub use challenge_store::ChallengeStore;
pub use error::ChallengeStoreError;
pub use standings::{MemberStanding, WinnerEntry};
