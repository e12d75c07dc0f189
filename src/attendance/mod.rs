pub mod aggregate;
pub mod schedule;
pub mod timecalc;
