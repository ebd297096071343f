//! Budget model
//!
//! A budget is a named container of funds. Funds point at their budget through
//! `Fund::budget_id`; a budget never holds its funds directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BudgetId;
use super::NameValidationError;

/// A named container of funds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// Budget name, also the lookup key for sub-budget reuse
    pub name: String,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last modified
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new budget
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive name comparison used for fetch-or-create lookups
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), NameValidationError> {
        NameValidationError::check(&self.name)
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_budget() {
        let budget = Budget::new("Work");
        assert_eq!(budget.name, "Work");
        assert_eq!(budget.created_at, budget.updated_at);
        assert!(budget.validate().is_ok());
    }

    #[test]
    fn test_has_name_ignores_case_and_padding() {
        let budget = Budget::new("Home Projects");
        assert!(budget.has_name("home projects"));
        assert!(budget.has_name("  HOME PROJECTS "));
        assert!(!budget.has_name("Home"));
    }

    #[test]
    fn test_blank_name_invalid() {
        let budget = Budget::new("   ");
        assert_eq!(budget.validate(), Err(NameValidationError::EmptyName));
    }
}
