//! Budget paths on the command line
//!
//! A path is a budget name followed by fund names, separated by `/`:
//! `Work/Projects/Code` names the fund `Code` inside the sub-budget reached
//! through fund `Projects` of budget `Work`. Matching is case-insensitive.

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{BudgetStack, Fund};
use crate::services::HierarchyService;
use crate::storage::Storage;

pub const SEPARATOR: char = '/';

fn segments(path: &str) -> TimeBudgetResult<Vec<&str>> {
    let parts: Vec<&str> = path
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(TimeBudgetError::Validation("Path cannot be empty".into()));
    }
    Ok(parts)
}

fn drill(storage: &Storage, root: &str, funds: &[&str]) -> TimeBudgetResult<BudgetStack> {
    let budget = storage
        .budget_by_name(root)?
        .ok_or_else(|| TimeBudgetError::budget_not_found(root))?;
    let mut stack = BudgetStack::with_root(budget.id);

    let hierarchy = HierarchyService::new(storage);
    for name in funds {
        let fund = find_fund(storage, &stack, name)?;
        hierarchy.drill_into(&mut stack, fund.id)?;
    }
    Ok(stack)
}

fn find_fund(storage: &Storage, stack: &BudgetStack, name: &str) -> TimeBudgetResult<Fund> {
    storage
        .fund_by_name(stack.top()?, name)?
        .ok_or_else(|| TimeBudgetError::fund_not_found(name))
}

/// Resolve a path that ends at a budget
pub fn resolve_budget(storage: &Storage, path: &str) -> TimeBudgetResult<BudgetStack> {
    let parts = segments(path)?;
    drill(storage, parts[0], &parts[1..])
}

/// Resolve a path that ends at a fund
///
/// The returned stack has the fund's budget on top.
pub fn resolve_fund(storage: &Storage, path: &str) -> TimeBudgetResult<(BudgetStack, Fund)> {
    let parts = segments(path)?;
    let Some((leaf, parents)) = parts.split_last() else {
        return Err(TimeBudgetError::Validation("Path cannot be empty".into()));
    };
    if parents.is_empty() {
        return Err(TimeBudgetError::Validation(format!(
            "'{}' names a budget; expected <budget>/<fund>",
            path
        )));
    }

    let stack = drill(storage, parents[0], &parents[1..])?;
    let fund = find_fund(storage, &stack, leaf)?;
    Ok((stack, fund))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Storage {
        let storage = Storage::in_memory();
        let hierarchy = HierarchyService::new(&storage);
        let work = hierarchy.create_budget("Work").unwrap();
        let projects = Fund::new("Projects", work.id);
        storage.insert(projects.clone()).unwrap();
        storage.save().unwrap();
        let sub = hierarchy.attach_sub_budget(projects.id, "Projects").unwrap();
        storage.insert(Fund::new("Code", sub.id)).unwrap();
        storage.save().unwrap();
        storage
    }

    #[test]
    fn test_resolve_nested_fund() {
        let storage = setup();
        let (stack, fund) = resolve_fund(&storage, "work / projects / code").unwrap();
        assert_eq!(fund.name, "Code");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.via_funds().len(), 1);
    }

    #[test]
    fn test_resolve_budget() {
        let storage = setup();
        let stack = resolve_budget(&storage, "Work/Projects").unwrap();
        let top = storage.get_budget(stack.top().unwrap()).unwrap().unwrap();
        assert_eq!(top.name, "Projects");
    }

    #[test]
    fn test_bad_paths() {
        let storage = setup();
        assert!(resolve_fund(&storage, "Work").unwrap_err().is_validation());
        assert!(resolve_fund(&storage, "Work/Missing").unwrap_err().is_not_found());
        assert!(resolve_budget(&storage, "Nowhere").unwrap_err().is_not_found());
        assert!(resolve_budget(&storage, " / ").unwrap_err().is_validation());
    }
}
