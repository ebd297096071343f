//! Balance engine
//!
//! Spend, earn and reset are each one transaction: the balance changes, the
//! partition re-placement of any fund that crossed between Available and
//! Spent, and the save all succeed together or not at all. Listeners hear
//! about the change only after the store has accepted it.
//!
//! Attaching or detaching a sub-budget also goes through here so the fund list
//! refreshes. One user gesture never combines a link change with a balance
//! change on the same fund; nothing below enforces that.

use tracing::{debug, info};

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{Budget, BudgetId, BudgetStack, Fund, FundId, FundPartition};
use crate::state::{AppState, RefreshKey};
use crate::storage::Storage;

use super::hierarchy::HierarchyService;
use super::ordering::settle_partitions;
use super::transact;

/// Service for balance changes on funds
pub struct BalanceService<'a> {
    storage: &'a Storage,
    state: &'a AppState,
}

impl<'a> BalanceService<'a> {
    pub fn new(storage: &'a Storage, state: &'a AppState) -> Self {
        Self { storage, state }
    }

    /// Spend one unit of a fund in the budget on top of `stack`
    ///
    /// Every fund whose sub-budget was entered to reach that budget is charged
    /// one unit as well.
    pub fn spend(&self, fund_id: FundId, stack: &BudgetStack) -> TimeBudgetResult<Fund> {
        let top = stack.top()?;
        let fund = self.storage.require::<Fund>(fund_id)?;
        if fund.budget_id != top {
            return Err(TimeBudgetError::Validation(format!(
                "Fund '{}' is not in the current budget",
                fund.name
            )));
        }

        let mut targets = vec![fund_id];
        for ancestor in HierarchyService::new(self.storage).ancestor_funds(stack)? {
            if !targets.contains(&ancestor.id) {
                targets.push(ancestor.id);
            }
        }

        self.apply("spend", &targets, |f| f.adjust_balance(-1))?;
        debug!(fund = %fund_id, cascaded = targets.len() - 1, "spent");
        self.storage.require(fund_id)
    }

    /// Add one unit to a fund; ancestors are not credited
    pub fn earn(&self, fund_id: FundId) -> TimeBudgetResult<Fund> {
        self.storage.require::<Fund>(fund_id)?;
        self.apply("earn", &[fund_id], |f| f.adjust_balance(1))?;
        debug!(fund = %fund_id, "earned");
        self.storage.require(fund_id)
    }

    /// Restore a fund's balance to its reset value
    pub fn reset(&self, fund_id: FundId) -> TimeBudgetResult<Fund> {
        self.storage.require::<Fund>(fund_id)?;
        self.apply("reset", &[fund_id], Fund::reset_balance)?;
        debug!(fund = %fund_id, "reset");
        self.storage.require(fund_id)
    }

    // === Apply to all ===
    //
    // Bulk actions touch every fund of one budget (optionally one partition)
    // and never cascade.

    pub fn spend_all(
        &self,
        budget_id: BudgetId,
        scope: Option<FundPartition>,
    ) -> TimeBudgetResult<usize> {
        self.apply_all("spend_all", budget_id, scope, |f| f.adjust_balance(-1))
    }

    pub fn earn_all(
        &self,
        budget_id: BudgetId,
        scope: Option<FundPartition>,
    ) -> TimeBudgetResult<usize> {
        self.apply_all("earn_all", budget_id, scope, |f| f.adjust_balance(1))
    }

    pub fn reset_all(
        &self,
        budget_id: BudgetId,
        scope: Option<FundPartition>,
    ) -> TimeBudgetResult<usize> {
        self.apply_all("reset_all", budget_id, scope, Fund::reset_balance)
    }

    // === Sub-budget links ===

    pub fn attach_sub_budget(&self, fund_id: FundId, name: &str) -> TimeBudgetResult<Budget> {
        let budget = HierarchyService::new(self.storage).attach_sub_budget(fund_id, name)?;
        self.state.notify(RefreshKey::FundList);
        Ok(budget)
    }

    pub fn detach_sub_budget(&self, fund_id: FundId) -> TimeBudgetResult<()> {
        if HierarchyService::new(self.storage)
            .detach_sub_budget(fund_id)?
            .is_some()
        {
            self.state.notify(RefreshKey::FundList);
        }
        Ok(())
    }

    /// Detach a linked sub-budget, or attach one named after the fund
    ///
    /// Returns the newly attached budget, if any.
    pub fn toggle_sub_budget(&self, fund_id: FundId) -> TimeBudgetResult<Option<Budget>> {
        let fund = self.storage.require::<Fund>(fund_id)?;
        if fund.has_sub_budget() {
            self.detach_sub_budget(fund_id)?;
            Ok(None)
        } else {
            self.attach_sub_budget(fund_id, &fund.name).map(Some)
        }
    }

    fn apply_all<F>(
        &self,
        operation: &'static str,
        budget_id: BudgetId,
        scope: Option<FundPartition>,
        change: F,
    ) -> TimeBudgetResult<usize>
    where
        F: Fn(&mut Fund),
    {
        self.storage.require::<Budget>(budget_id)?;
        let targets: Vec<FundId> = self
            .storage
            .funds_in_budget(budget_id)?
            .into_iter()
            .filter(|f| scope.map_or(true, |p| f.partition() == p))
            .map(|f| f.id)
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }

        self.apply(operation, &targets, change)?;
        info!(operation, budget = %budget_id, funds = targets.len(), "applied to all funds");
        Ok(targets.len())
    }

    fn apply<F>(&self, operation: &'static str, targets: &[FundId], change: F) -> TimeBudgetResult<()>
    where
        F: Fn(&mut Fund),
    {
        transact(self.storage, operation, || {
            let mut before = Vec::with_capacity(targets.len());
            for &id in targets {
                let partition = self.storage.update::<Fund, _, _>(id, |fund| {
                    let partition = fund.partition();
                    change(fund);
                    partition
                })?;
                before.push((id, partition));
            }
            settle_partitions(self.storage, &before)
        })?;

        self.state.notify(RefreshKey::FundList);
        Ok(())
    }
}
