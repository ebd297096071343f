//! Named queries over the entity graph

use std::collections::HashSet;

use crate::error::TimeBudgetResult;
use crate::models::{Budget, BudgetId, Expense, Fund, FundId, FundPartition};

use super::Storage;

impl Storage {
    pub fn get_budget(&self, id: BudgetId) -> TimeBudgetResult<Option<Budget>> {
        self.get(id)
    }

    pub fn get_fund(&self, id: FundId) -> TimeBudgetResult<Option<Fund>> {
        self.get(id)
    }

    /// All budgets, sorted by name
    pub fn all_budgets(&self) -> TimeBudgetResult<Vec<Budget>> {
        self.fetch(|_: &Budget| true, |a, b| a.name.cmp(&b.name))
    }

    /// Find a budget by name (case-insensitive)
    pub fn budget_by_name(&self, name: &str) -> TimeBudgetResult<Option<Budget>> {
        let matches = self.fetch(|b: &Budget| b.has_name(name), |a, b| a.created_at.cmp(&b.created_at))?;
        Ok(matches.into_iter().next())
    }

    /// Budgets no fund links to as a sub-budget, sorted by name
    pub fn root_budgets(&self) -> TimeBudgetResult<Vec<Budget>> {
        let linked: HashSet<BudgetId> = self
            .fetch(|f: &Fund| f.has_sub_budget(), |a, b| a.id.cmp(&b.id))?
            .into_iter()
            .filter_map(|f| f.sub_budget_id)
            .collect();

        self.fetch(
            |b: &Budget| !linked.contains(&b.id),
            |a, b| a.name.cmp(&b.name),
        )
    }

    /// Every fund of a budget: available first, then spent, each by order
    pub fn funds_in_budget(&self, budget_id: BudgetId) -> TimeBudgetResult<Vec<Fund>> {
        self.fetch(
            |f: &Fund| f.budget_id == budget_id,
            |a, b| {
                (a.partition() as u8, a.order, &a.name).cmp(&(b.partition() as u8, b.order, &b.name))
            },
        )
    }

    /// One ordering group of a budget, in display order
    pub fn funds_in_group(
        &self,
        budget_id: BudgetId,
        partition: FundPartition,
    ) -> TimeBudgetResult<Vec<Fund>> {
        self.fetch(
            |f: &Fund| f.budget_id == budget_id && f.partition() == partition,
            |a, b| (a.order, &a.name).cmp(&(b.order, &b.name)),
        )
    }

    /// Find a fund of a budget by name (case-insensitive)
    pub fn fund_by_name(&self, budget_id: BudgetId, name: &str) -> TimeBudgetResult<Option<Fund>> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .funds_in_budget(budget_id)?
            .into_iter()
            .find(|f| f.name.to_lowercase() == name_lower))
    }

    /// Funds whose sub-budget link points at `budget_id`
    pub fn funds_linking_to(&self, budget_id: BudgetId) -> TimeBudgetResult<Vec<Fund>> {
        self.fetch(
            |f: &Fund| f.sub_budget_id == Some(budget_id),
            |a, b| a.name.cmp(&b.name),
        )
    }

    /// All expenses, oldest first
    pub fn expenses(&self) -> TimeBudgetResult<Vec<Expense>> {
        self.fetch(|_: &Expense| true, |a, b| a.when.cmp(&b.when))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_budgets_exclude_linked() {
        let storage = Storage::in_memory();
        let work = Budget::new("Work");
        let projects = Budget::new("Projects");
        let mut fund = Fund::new("Projects", work.id);
        fund.sub_budget_id = Some(projects.id);

        storage.insert(work.clone()).unwrap();
        storage.insert(projects).unwrap();
        storage.insert(fund).unwrap();

        let roots = storage.root_budgets().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, work.id);
    }

    #[test]
    fn test_funds_in_group_by_partition() {
        let storage = Storage::in_memory();
        let budget = Budget::new("Work");
        let mut email = Fund::new("Email", budget.id);
        email.order = 1;
        let mut code = Fund::new("Code", budget.id);
        code.order = 0;
        let spent = Fund::new("Meetings", budget.id).with_reset_value(0);

        for fund in [email, code, spent] {
            storage.insert(fund).unwrap();
        }

        let available = storage
            .funds_in_group(budget.id, FundPartition::Available)
            .unwrap();
        let names: Vec<_> = available.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Code", "Email"]);

        let spent = storage.funds_in_group(budget.id, FundPartition::Spent).unwrap();
        assert_eq!(spent.len(), 1);
        assert_eq!(storage.funds_in_budget(budget.id).unwrap().len(), 3);
    }

    #[test]
    fn test_lookup_by_name() {
        let storage = Storage::in_memory();
        let budget = Budget::new("Home Chores");
        storage.insert(budget.clone()).unwrap();
        storage.insert(Fund::new("Dishes", budget.id)).unwrap();

        assert!(storage.budget_by_name("home chores").unwrap().is_some());
        assert!(storage.fund_by_name(budget.id, "DISHES").unwrap().is_some());
        assert!(storage.budget_by_name("Garden").unwrap().is_none());
    }
}
