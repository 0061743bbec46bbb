#![forbid(unsafe_code)]

pub mod color;
pub mod model;
pub mod time;
pub mod timestamp;

pub use time::Clock;
