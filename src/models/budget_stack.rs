//! Budget navigation stack
//!
//! The chain of budgets the user has drilled into, root first. Each level below
//! the root remembers the fund whose sub-budget was entered, which is what a
//! spend cascades to.

use super::ids::{BudgetId, FundId};
use crate::error::{TimeBudgetError, TimeBudgetResult};

/// One level of the navigation chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame {
    pub budget: BudgetId,
    /// Fund in the previous level that led here (`None` for the root)
    pub via_fund: Option<FundId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetStack {
    frames: Vec<StackFrame>,
}

impl BudgetStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a stack at a root budget
    pub fn with_root(budget: BudgetId) -> Self {
        let mut stack = Self::new();
        stack.push(budget);
        stack
    }

    /// Append a budget without a linking fund
    pub fn push(&mut self, budget: BudgetId) {
        self.frames.push(StackFrame {
            budget,
            via_fund: None,
        });
    }

    /// Drill into `sub_budget` through `fund`
    pub fn push_sub_budget(&mut self, fund: FundId, sub_budget: BudgetId) {
        self.frames.push(StackFrame {
            budget: sub_budget,
            via_fund: Some(fund),
        });
    }

    /// Leave the current level; the root is never popped
    pub fn pop(&mut self) -> Option<StackFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Truncate to the root budget only
    pub fn to_first_budget(&mut self) {
        self.frames.truncate(1);
    }

    pub fn has_top(&self) -> bool {
        !self.frames.is_empty()
    }

    /// The budget currently viewed
    pub fn top(&self) -> TimeBudgetResult<BudgetId> {
        self.frames
            .last()
            .map(|frame| frame.budget)
            .ok_or(TimeBudgetError::EmptyStack)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Budgets on the stack, root first
    pub fn budgets(&self) -> Vec<BudgetId> {
        self.frames.iter().map(|frame| frame.budget).collect()
    }

    /// Funds recorded as drill-down links, oldest ancestor first
    pub fn via_funds(&self) -> Vec<FundId> {
        self.frames.iter().filter_map(|frame| frame.via_fund).collect()
    }
}
