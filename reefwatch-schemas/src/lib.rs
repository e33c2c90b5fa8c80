//! Data model shared by the reefwatch crates: water tests, tanks, salt mixes
//! and maintenance records, plus the YAML file wrappers they are loaded from.

pub mod file_formats;
pub mod maintenance;
pub mod parameters;
pub mod salt_mix;
pub mod tank;
