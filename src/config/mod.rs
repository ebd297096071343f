//! Configuration module for time-budget
//!
//! - Platform-aware path resolution
//! - The persisted settings singleton

pub mod paths;
pub mod settings;

pub use paths::TimeBudgetPaths;
pub use settings::Settings;
