pub mod attendance;
pub mod punch;
pub mod schedule;
