pub mod annuity;
pub mod capacity;
pub mod flat;
pub mod schedule;
