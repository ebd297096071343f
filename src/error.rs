//! Custom error types for time-budget
//!
//! This module defines the error hierarchy for the application using thiserror.
//! Low-level store failures are translated into `PersistenceFailed` before they
//! reach callers of the service layer.

use thiserror::Error;

/// The main error type for time-budget operations
#[derive(Error, Debug)]
pub enum TimeBudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Low-level storage errors (lock poisoning, unreadable files)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The store refused the save; the working graph was rolled back
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Linking a sub-budget would make a budget reachable from itself
    #[error("Attaching '{budget}' under fund '{fund}' would create a cycle")]
    CycleDetected { fund: String, budget: String },

    /// The navigation stack has no budget on it
    #[error("Budget stack is empty")]
    EmptyStack,

    /// Legacy data migration failed; the data version was left unchanged
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl TimeBudgetError {
    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for funds
    pub fn fund_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Fund",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from a refused save
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::PersistenceFailed(_))
    }
}

impl From<std::io::Error> for TimeBudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TimeBudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for time-budget operations
pub type TimeBudgetResult<T> = Result<T, TimeBudgetError>;
