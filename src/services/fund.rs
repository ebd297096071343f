//! Fund service
//!
//! Creating, renaming, deleting and reordering funds. Each change reindexes the
//! affected group in the same commit.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{
    Budget, BudgetId, Fund, FundId, FundPartition, ListPosition, NameValidationError,
    DEFAULT_RESET_VALUE,
};
use crate::state::{AppState, RefreshKey};
use crate::storage::Storage;

use super::ordering::{close_gaps, group_members, move_member, reindex};
use super::transact;

/// Service for fund management
pub struct FundService<'a> {
    storage: &'a Storage,
    state: &'a AppState,
}

impl<'a> FundService<'a> {
    pub fn new(storage: &'a Storage, state: &'a AppState) -> Self {
        Self { storage, state }
    }

    /// Add a fund with the default reset value at the head or tail of its group
    ///
    /// A blank name is ignored and yields `None`.
    pub fn create_fund(
        &self,
        budget_id: BudgetId,
        name: &str,
        position: ListPosition,
    ) -> TimeBudgetResult<Option<Fund>> {
        self.create_fund_with_reset(budget_id, name, position, DEFAULT_RESET_VALUE)
    }

    /// Add a fund whose balance starts at `reset_value`, in one commit
    ///
    /// The fund joins the group its starting balance puts it in.
    pub fn create_fund_with_reset(
        &self,
        budget_id: BudgetId,
        name: &str,
        position: ListPosition,
        reset_value: i64,
    ) -> TimeBudgetResult<Option<Fund>> {
        let name = name.trim();
        if name.is_empty() {
            debug!(budget = %budget_id, "blank fund name ignored");
            return Ok(None);
        }
        self.storage.require::<Budget>(budget_id)?;
        self.check_unique(budget_id, name, None)?;

        let fund = Fund::new(name, budget_id).with_reset_value(reset_value);
        fund.validate()
            .map_err(|e| TimeBudgetError::Validation(e.to_string()))?;

        let fund_id = fund.id;
        transact(self.storage, "create_fund", || {
            let mut members = group_members(self.storage, budget_id, fund.partition())?;
            self.storage.insert(fund)?;
            match position {
                ListPosition::Head => members.insert(0, fund_id),
                ListPosition::Tail => members.push(fund_id),
            }
            reindex(self.storage, &members)?;
            Ok(())
        })?;

        info!(fund = %fund_id, budget = %budget_id, "fund created");
        self.state.notify(RefreshKey::FundList);
        self.storage.get_fund(fund_id)
    }

    /// Rename a fund; a blank name deletes it instead
    pub fn rename_fund(&self, fund_id: FundId, name: &str) -> TimeBudgetResult<Option<Fund>> {
        let name = name.trim();
        if name.is_empty() {
            self.delete_fund(fund_id)?;
            return Ok(None);
        }

        let fund = self.storage.require::<Fund>(fund_id)?;
        if fund.name == name {
            return Ok(Some(fund));
        }
        self.check_unique(fund.budget_id, name, Some(fund_id))?;
        NameValidationError::check(name)
            .map_err(|e| TimeBudgetError::Validation(e.to_string()))?;

        transact(self.storage, "rename_fund", || {
            self.storage.update::<Fund, _, _>(fund_id, |f| {
                f.name = name.to_string();
                f.updated_at = Utc::now();
            })
        })?;

        self.state.notify(RefreshKey::FundList);
        self.storage.get_fund(fund_id)
    }

    /// Remove a fund and close the gap it leaves in its group
    ///
    /// A sub-budget the fund linked to is kept.
    pub fn delete_fund(&self, fund_id: FundId) -> TimeBudgetResult<Fund> {
        let fund = self.storage.require::<Fund>(fund_id)?;

        transact(self.storage, "delete_fund", || {
            self.storage.delete::<Fund>(fund_id)?;
            close_gaps(self.storage, fund.budget_id, fund.partition())?;
            Ok(())
        })?;

        info!(fund = %fund_id, name = %fund.name, "fund deleted");
        self.state.notify(RefreshKey::FundList);
        Ok(fund)
    }

    /// Move the fund at position `from` of a group to position `to`
    pub fn move_fund(
        &self,
        budget_id: BudgetId,
        partition: FundPartition,
        from: usize,
        to: usize,
    ) -> TimeBudgetResult<()> {
        let mut members = group_members(self.storage, budget_id, partition)?;
        move_member(&mut members, from, to)?;

        let changed = transact(self.storage, "move_fund", || reindex(self.storage, &members))?;
        if changed > 0 {
            self.state.notify(RefreshKey::FundList);
        }
        Ok(())
    }

    /// Change the value a reset restores; the balance is left alone
    pub fn set_reset_value(&self, fund_id: FundId, reset_value: i64) -> TimeBudgetResult<Fund> {
        transact(self.storage, "set_reset_value", || {
            self.storage.update::<Fund, _, _>(fund_id, |f| {
                f.reset_value = reset_value;
                f.updated_at = Utc::now();
            })
        })?;

        self.state.notify(RefreshKey::FundList);
        self.storage.require(fund_id)
    }

    fn check_unique(
        &self,
        budget_id: BudgetId,
        name: &str,
        except: Option<FundId>,
    ) -> TimeBudgetResult<()> {
        match self.storage.fund_by_name(budget_id, name)? {
            Some(existing) if Some(existing.id) != except => Err(TimeBudgetError::Duplicate {
                entity_type: "Fund",
                identifier: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
