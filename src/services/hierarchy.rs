//! Budget/fund hierarchy
//!
//! Budgets form a tree (more precisely a DAG, since sub-budgets are shared by
//! name) through `Fund::sub_budget_id`. Every link is checked before it is
//! made: no budget may ever reach itself through a chain of sub-budget links.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{Budget, BudgetId, BudgetStack, Fund, FundId};
use crate::state::{AppState, RefreshKey};
use crate::storage::Storage;

use super::transact;

/// Service for budget structure and sub-budget links
pub struct HierarchyService<'a> {
    storage: &'a Storage,
    state: Option<&'a AppState>,
}

impl<'a> HierarchyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            state: None,
        }
    }

    /// Notify `state` after budget creation and deletion commit
    pub fn with_state(mut self, state: &'a AppState) -> Self {
        self.state = Some(state);
        self
    }

    fn notify(&self, keys: &[RefreshKey]) {
        if let Some(state) = self.state {
            for key in keys {
                state.notify(*key);
            }
        }
    }

    // === Budgets ===

    /// Create a new budget; names are unique (case-insensitive)
    pub fn create_budget(&self, name: &str) -> TimeBudgetResult<Budget> {
        let name = name.trim();
        let budget = Budget::new(name);
        budget
            .validate()
            .map_err(|e| TimeBudgetError::Validation(e.to_string()))?;

        if self.storage.budget_by_name(name)?.is_some() {
            return Err(TimeBudgetError::Duplicate {
                entity_type: "Budget",
                identifier: name.to_string(),
            });
        }

        transact(self.storage, "create_budget", || {
            self.storage.insert(budget.clone())
        })?;
        info!(budget = %budget.id, name = %budget.name, "budget created");
        self.notify(&[RefreshKey::TopView]);
        Ok(budget)
    }

    /// Delete a budget and its funds
    ///
    /// Funds elsewhere that linked to it lose their sub-budget link. Budgets
    /// linked from the deleted funds are left alone.
    pub fn delete_budget(&self, budget_id: BudgetId) -> TimeBudgetResult<Budget> {
        let budget = self.storage.require::<Budget>(budget_id)?;

        transact(self.storage, "delete_budget", || {
            for fund in self.storage.funds_in_budget(budget_id)? {
                self.storage.delete::<Fund>(fund.id)?;
            }
            for fund in self.storage.funds_linking_to(budget_id)? {
                self.storage.update::<Fund, _, _>(fund.id, |f| {
                    f.sub_budget_id = None;
                    f.updated_at = Utc::now();
                })?;
            }
            self.storage.delete::<Budget>(budget_id)?;
            Ok(())
        })?;

        info!(budget = %budget_id, name = %budget.name, "budget deleted");
        self.notify(&[RefreshKey::TopView, RefreshKey::BudgetStack, RefreshKey::FundList]);
        Ok(budget)
    }

    // === Lookups ===

    /// The budget a fund belongs to
    pub fn owning_budget(&self, fund_id: FundId) -> TimeBudgetResult<Budget> {
        let fund = self.storage.require::<Fund>(fund_id)?;
        self.storage.require::<Budget>(fund.budget_id)
    }

    /// The budget a fund drills down into, if any
    pub fn sub_budget(&self, fund_id: FundId) -> TimeBudgetResult<Option<Budget>> {
        let fund = self.storage.require::<Fund>(fund_id)?;
        match fund.sub_budget_id {
            Some(id) => self.storage.get_budget(id),
            None => Ok(None),
        }
    }

    /// Whether `target` can be reached from `start` through sub-budget links
    ///
    /// A budget trivially reaches itself.
    pub fn reaches(&self, start: BudgetId, target: BudgetId) -> TimeBudgetResult<bool> {
        let mut edges: HashMap<BudgetId, Vec<BudgetId>> = HashMap::new();
        for fund in self
            .storage
            .fetch(|f: &Fund| f.has_sub_budget(), |a, b| a.id.cmp(&b.id))?
        {
            if let Some(sub) = fund.sub_budget_id {
                edges.entry(fund.budget_id).or_default().push(sub);
            }
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(budget) = queue.pop_front() {
            if budget == target {
                return Ok(true);
            }
            if !seen.insert(budget) {
                continue;
            }
            if let Some(children) = edges.get(&budget) {
                queue.extend(children.iter().copied());
            }
        }
        Ok(false)
    }

    // === Sub-budget links ===

    /// Link a fund to the budget called `name`, creating that budget if needed
    ///
    /// Fails with `CycleDetected`, leaving the graph untouched, if the fund's
    /// own budget is reachable from the candidate.
    pub fn attach_sub_budget(&self, fund_id: FundId, name: &str) -> TimeBudgetResult<Budget> {
        let fund = self.storage.require::<Fund>(fund_id)?;
        let name = name.trim();

        let (sub_budget, created) = match self.storage.budget_by_name(name)? {
            Some(existing) => {
                if self.reaches(existing.id, fund.budget_id)? {
                    warn!(fund = %fund.id, budget = %existing.id, "sub-budget link rejected: cycle");
                    return Err(TimeBudgetError::CycleDetected {
                        fund: fund.name.clone(),
                        budget: existing.name.clone(),
                    });
                }
                (existing, false)
            }
            None => {
                let budget = Budget::new(name);
                budget
                    .validate()
                    .map_err(|e| TimeBudgetError::Validation(e.to_string()))?;
                (budget, true)
            }
        };

        transact(self.storage, "attach_sub_budget", || {
            if created {
                self.storage.insert(sub_budget.clone())?;
            }
            self.storage.update::<Fund, _, _>(fund_id, |f| {
                f.sub_budget_id = Some(sub_budget.id);
                f.updated_at = Utc::now();
            })
        })?;

        debug!(fund = %fund_id, budget = %sub_budget.id, created, "sub-budget attached");
        Ok(sub_budget)
    }

    /// Clear a fund's sub-budget link; the budget itself is kept
    pub fn detach_sub_budget(&self, fund_id: FundId) -> TimeBudgetResult<Option<BudgetId>> {
        let previous = self.storage.require::<Fund>(fund_id)?.sub_budget_id;
        if previous.is_none() {
            return Ok(None);
        }

        transact(self.storage, "detach_sub_budget", || {
            self.storage.update::<Fund, _, _>(fund_id, |f| {
                f.sub_budget_id = None;
                f.updated_at = Utc::now();
            })
        })?;

        debug!(fund = %fund_id, "sub-budget detached");
        Ok(previous)
    }

    // === Navigation ===

    /// Drill from the current budget into a fund's sub-budget
    pub fn drill_into(&self, stack: &mut BudgetStack, fund_id: FundId) -> TimeBudgetResult<Budget> {
        let top = stack.top()?;
        let fund = self.storage.require::<Fund>(fund_id)?;
        if fund.budget_id != top {
            return Err(TimeBudgetError::Validation(format!(
                "Fund '{}' is not in the current budget",
                fund.name
            )));
        }
        let sub_id = fund.sub_budget_id.ok_or_else(|| {
            TimeBudgetError::Validation(format!("Fund '{}' has no sub-budget", fund.name))
        })?;
        let sub_budget = self.storage.require::<Budget>(sub_id)?;
        stack.push_sub_budget(fund.id, sub_budget.id);
        Ok(sub_budget)
    }

    /// Funds whose sub-budgets were entered to reach the top of `stack`
    ///
    /// Oldest ancestor first. A recorded fund that was deleted or no longer
    /// links the two levels is skipped.
    pub fn ancestor_funds(&self, stack: &BudgetStack) -> TimeBudgetResult<Vec<Fund>> {
        let mut ancestors = Vec::new();
        for pair in stack.frames().windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            let Some(via) = child.via_fund else {
                continue;
            };
            match self.storage.get_fund(via)? {
                Some(fund)
                    if fund.budget_id == parent.budget
                        && fund.sub_budget_id == Some(child.budget) =>
                {
                    ancestors.push(fund)
                }
                _ => warn!(fund = %via, "stale ancestor link on budget stack, skipping"),
            }
        }
        Ok(ancestors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPersistence;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add_fund(storage: &Storage, budget: BudgetId, name: &str) -> Fund {
        let fund = Fund::new(name, budget);
        storage.insert(fund.clone()).unwrap();
        storage.save().unwrap();
        fund
    }

    #[test]
    fn test_create_budget_rejects_duplicates() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);

        service.create_budget("Work").unwrap();
        let result = service.create_budget("  work ");
        assert!(matches!(result, Err(TimeBudgetError::Duplicate { .. })));
        assert!(service.create_budget("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_attach_creates_new_budget_once() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let fund = add_fund(&storage, work.id, "Projects");

        let sub = service.attach_sub_budget(fund.id, "Projects").unwrap();

        assert_eq!(storage.all_budgets().unwrap().len(), 2);
        assert_eq!(service.sub_budget(fund.id).unwrap().unwrap().id, sub.id);
        assert_eq!(service.owning_budget(fund.id).unwrap().id, work.id);
    }

    #[test]
    fn test_attach_reuses_budget_with_same_name() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let home = service.create_budget("Home").unwrap();
        let errands = service.create_budget("Errands").unwrap();
        let a = add_fund(&storage, work.id, "Errands");
        let b = add_fund(&storage, home.id, "Errands");

        let first = service.attach_sub_budget(a.id, "Errands").unwrap();
        let second = service.attach_sub_budget(b.id, "errands").unwrap();

        assert_eq!(first.id, errands.id);
        assert_eq!(second.id, errands.id);
        assert_eq!(storage.all_budgets().unwrap().len(), 3);
    }

    #[test]
    fn test_attach_rejects_direct_cycle() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let fund = add_fund(&storage, work.id, "Loop");

        let before = storage.get_fund(fund.id).unwrap();
        let result = service.attach_sub_budget(fund.id, "Work");

        assert!(matches!(result, Err(TimeBudgetError::CycleDetected { .. })));
        assert_eq!(storage.get_fund(fund.id).unwrap(), before);
        assert!(!storage.has_changes().unwrap());
    }

    #[test]
    fn test_attach_rejects_transitive_cycle() {
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone());
        let service = HierarchyService::new(&storage);

        let work = service.create_budget("Work").unwrap();
        let projects_fund = add_fund(&storage, work.id, "Projects");
        let projects = service.attach_sub_budget(projects_fund.id, "Projects").unwrap();
        let deep_fund = add_fund(&storage, projects.id, "Deep");
        let deep = service.attach_sub_budget(deep_fund.id, "Deep").unwrap();
        let leaf = add_fund(&storage, deep.id, "Back to work");

        let saved_before = backend.saved_data();
        let result = service.attach_sub_budget(leaf.id, "Work");

        assert!(matches!(result, Err(TimeBudgetError::CycleDetected { .. })));
        assert_eq!(backend.saved_data(), saved_before);
        assert!(service.reaches(work.id, deep.id).unwrap());
        assert!(!service.reaches(deep.id, work.id).unwrap());
    }

    #[test]
    fn test_detach_keeps_budget() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let fund = add_fund(&storage, work.id, "Projects");
        let sub = service.attach_sub_budget(fund.id, "Projects").unwrap();

        assert_eq!(service.detach_sub_budget(fund.id).unwrap(), Some(sub.id));
        assert!(service.sub_budget(fund.id).unwrap().is_none());
        assert!(storage.get_budget(sub.id).unwrap().is_some());
        assert_eq!(service.detach_sub_budget(fund.id).unwrap(), None);
    }

    #[test]
    fn test_delete_budget_cascades_and_unlinks() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let fund = add_fund(&storage, work.id, "Projects");
        let sub = service.attach_sub_budget(fund.id, "Projects").unwrap();
        let inner = add_fund(&storage, sub.id, "Code");

        service.delete_budget(sub.id).unwrap();

        assert!(storage.get_budget(sub.id).unwrap().is_none());
        assert!(storage.get_fund(inner.id).unwrap().is_none());
        assert!(storage.get_fund(fund.id).unwrap().unwrap().sub_budget_id.is_none());
    }

    #[test]
    fn test_ancestor_funds_follow_stack() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let projects_fund = add_fund(&storage, work.id, "Projects");
        service.attach_sub_budget(projects_fund.id, "Projects").unwrap();
        let projects = storage.budget_by_name("Projects").unwrap().unwrap();
        let alpha_fund = add_fund(&storage, projects.id, "Alpha");
        service.attach_sub_budget(alpha_fund.id, "Alpha").unwrap();

        let mut stack = BudgetStack::with_root(work.id);
        assert!(service.ancestor_funds(&stack).unwrap().is_empty());

        service.drill_into(&mut stack, projects_fund.id).unwrap();
        service.drill_into(&mut stack, alpha_fund.id).unwrap();

        let names: Vec<_> = service
            .ancestor_funds(&stack)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Projects", "Alpha"]);
    }

    #[test]
    fn test_drill_requires_sub_budget() {
        let storage = Storage::in_memory();
        let service = HierarchyService::new(&storage);
        let work = service.create_budget("Work").unwrap();
        let fund = add_fund(&storage, work.id, "Email");

        let mut stack = BudgetStack::with_root(work.id);
        assert!(service.drill_into(&mut stack, fund.id).unwrap_err().is_validation());

        let mut empty = BudgetStack::new();
        assert!(matches!(
            service.drill_into(&mut empty, fund.id),
            Err(TimeBudgetError::EmptyStack)
        ));
    }

    #[test]
    fn test_budget_changes_notify_after_commit() {
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone());
        let state = AppState::new();
        let service = HierarchyService::new(&storage).with_state(&state);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&seen);
        let saved = backend.clone();
        let _sub = state.subscribe(
            &[RefreshKey::TopView, RefreshKey::BudgetStack, RefreshKey::FundList],
            move |key| out.borrow_mut().push((key, saved.saved_data().budgets.len())),
        );

        let work = service.create_budget("Work").unwrap();
        assert_eq!(*seen.borrow(), vec![(RefreshKey::TopView, 1)]);

        seen.borrow_mut().clear();
        service.delete_budget(work.id).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                (RefreshKey::TopView, 0),
                (RefreshKey::BudgetStack, 0),
                (RefreshKey::FundList, 0),
            ]
        );
    }

    #[test]
    fn test_failed_budget_commit_does_not_notify() {
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone());
        let state = AppState::new();
        let service = HierarchyService::new(&storage).with_state(&state);

        let count = Rc::new(RefCell::new(0));
        let out = Rc::clone(&count);
        let _sub = state.subscribe(&[RefreshKey::TopView], move |_| *out.borrow_mut() += 1);

        backend.fail_next_save();
        assert!(service.create_budget("Work").is_err());
        assert_eq!(*count.borrow(), 0);
        assert!(storage.all_budgets().unwrap().is_empty());
    }
}
