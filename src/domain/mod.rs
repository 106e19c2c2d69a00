pub mod actor;
pub mod collision;
pub mod grid;
pub mod mode;
pub mod occupancy;
pub mod roll;
pub mod rules;
