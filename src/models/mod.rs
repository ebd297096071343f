//! Core data models for time-budget
//!
//! Budgets, funds and legacy expenses, plus the navigation stack used to walk
//! the budget tree.

pub mod budget;
pub mod budget_stack;
pub mod expense;
pub mod fund;
pub mod ids;

pub use budget::Budget;
pub use budget_stack::{BudgetStack, StackFrame};
pub use expense::{Expense, LEGACY_SLOT_MINUTES, NO_TIME_SLOT};
pub use fund::{Fund, FundPartition, ListPosition, DEFAULT_RESET_VALUE};
pub use ids::{BudgetId, ExpenseId, FundId};

use std::fmt;

/// Longest accepted budget or fund name
pub const MAX_NAME_LEN: usize = 64;

/// Validation errors shared by budget and fund names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl NameValidationError {
    pub(crate) fn check(name: &str) -> Result<(), Self> {
        if name.trim().is_empty() {
            return Err(Self::EmptyName);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(Self::NameTooLong(len));
        }
        Ok(())
    }
}

impl fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
        }
    }
}

impl std::error::Error for NameValidationError {}
