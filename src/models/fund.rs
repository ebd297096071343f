//! Fund model
//!
//! A fund is a spendable counter owned by exactly one budget. It may also link
//! to a sub-budget, which turns it into a node of the budget tree. The link is
//! non-owning: deleting the fund never deletes the sub-budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, FundId};
use super::NameValidationError;

/// Balance and reset value given to newly created funds
pub const DEFAULT_RESET_VALUE: i64 = 1;

/// The two independently ordered groups of funds within a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundPartition {
    /// Funds with balance left this period
    Available,
    /// Funds that have been used up
    Spent,
}

impl FundPartition {
    /// Which partition a balance falls into
    pub fn of_balance(balance: i64) -> Self {
        if balance > 0 {
            Self::Available
        } else {
            Self::Spent
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Available, Self::Spent]
    }
}

impl fmt::Display for FundPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Spent => write!(f, "Spent"),
        }
    }
}

/// Where a new fund lands in its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPosition {
    Head,
    Tail,
}

/// A named spendable counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    /// Unique identifier
    pub id: FundId,

    /// Fund name
    pub name: String,

    /// Owning budget
    pub budget_id: BudgetId,

    /// Budget this fund drills down into, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_budget_id: Option<BudgetId>,

    /// Position within its (budget, partition) group
    pub order: i32,

    /// Current balance; only the balance engine changes it
    balance: i64,

    /// Baseline restored by a reset
    pub reset_value: i64,

    /// When the fund was created
    pub created_at: DateTime<Utc>,

    /// When the fund was last modified
    pub updated_at: DateTime<Utc>,
}

impl Fund {
    /// Create a new fund in a budget
    pub fn new(name: impl Into<String>, budget_id: BudgetId) -> Self {
        let now = Utc::now();
        Self {
            id: FundId::new(),
            name: name.into(),
            budget_id,
            sub_budget_id: None,
            order: 0,
            balance: DEFAULT_RESET_VALUE,
            reset_value: DEFAULT_RESET_VALUE,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the reset value of a fresh fund; its balance starts there too
    pub fn with_reset_value(mut self, reset_value: i64) -> Self {
        self.reset_value = reset_value;
        self.balance = reset_value;
        self
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Which ordering group the fund currently belongs to
    pub fn partition(&self) -> FundPartition {
        FundPartition::of_balance(self.balance)
    }

    pub fn has_sub_budget(&self) -> bool {
        self.sub_budget_id.is_some()
    }

    pub(crate) fn adjust_balance(&mut self, delta: i64) {
        self.balance += delta;
        self.updated_at = Utc::now();
    }

    pub(crate) fn reset_balance(&mut self) {
        self.balance = self.reset_value;
        self.updated_at = Utc::now();
    }

    /// Validate the fund
    pub fn validate(&self) -> Result<(), NameValidationError> {
        NameValidationError::check(&self.name)
    }
}

impl fmt::Display for Fund {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fund_starts_available() {
        let fund = Fund::new("Email", BudgetId::new());
        assert_eq!(fund.balance(), DEFAULT_RESET_VALUE);
        assert_eq!(fund.partition(), FundPartition::Available);
        assert!(!fund.has_sub_budget());
    }

    #[test]
    fn test_partition_boundary() {
        assert_eq!(FundPartition::of_balance(1), FundPartition::Available);
        assert_eq!(FundPartition::of_balance(0), FundPartition::Spent);
        assert_eq!(FundPartition::of_balance(-3), FundPartition::Spent);
    }

    #[test]
    fn test_adjust_and_reset() {
        let mut fund = Fund::new("Email", BudgetId::new()).with_reset_value(5);
        fund.adjust_balance(-7);
        assert_eq!(fund.balance(), -2);
        fund.reset_balance();
        assert_eq!(fund.balance(), 5);
    }

    #[test]
    fn test_serialization_keeps_balance() {
        let fund = Fund::new("Email", BudgetId::new()).with_reset_value(3);
        let json = serde_json::to_string(&fund).unwrap();
        assert!(!json.contains("sub_budget_id"));
        let back: Fund = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fund);
    }
}
