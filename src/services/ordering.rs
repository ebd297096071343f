//! Ordering maintenance for fund groups
//!
//! Within a (budget, partition) group the `order` values of the funds always
//! form the dense sequence `0..n` once a structural change completes. These
//! helpers only touch the working graph; callers commit them together with the
//! change that made the reindex necessary, so a reindex is never committed on
//! its own or in part.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{BudgetId, Fund, FundId, FundPartition};
use crate::storage::Storage;

/// Set each fund's order to its position in `members`
///
/// Returns how many funds actually changed; a second call with the same
/// sequence returns 0.
pub fn reindex(storage: &Storage, members: &[FundId]) -> TimeBudgetResult<usize> {
    let mut changed = 0;
    for (index, &id) in members.iter().enumerate() {
        let order = i32::try_from(index)
            .map_err(|_| TimeBudgetError::Validation("Too many funds in one group".into()))?;
        let updated = storage.update::<Fund, _, _>(id, |fund| {
            if fund.order == order {
                return false;
            }
            fund.order = order;
            fund.updated_at = Utc::now();
            true
        })?;
        if updated {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Current display order of a group
pub fn group_members(
    storage: &Storage,
    budget_id: BudgetId,
    partition: FundPartition,
) -> TimeBudgetResult<Vec<FundId>> {
    Ok(storage
        .funds_in_group(budget_id, partition)?
        .into_iter()
        .map(|fund| fund.id)
        .collect())
}

/// Reindex a group in its current display order, closing any gaps
pub fn close_gaps(
    storage: &Storage,
    budget_id: BudgetId,
    partition: FundPartition,
) -> TimeBudgetResult<usize> {
    let members = group_members(storage, budget_id, partition)?;
    reindex(storage, &members)
}

/// Move the element at `from` so that it ends up at index `to`
pub fn move_member<T>(members: &mut Vec<T>, from: usize, to: usize) -> TimeBudgetResult<()> {
    if from >= members.len() || to >= members.len() {
        return Err(TimeBudgetError::Validation(format!(
            "Cannot move position {} to {} in a group of {}",
            from,
            to,
            members.len()
        )));
    }
    let member = members.remove(from);
    members.insert(to, member);
    Ok(())
}

/// Re-place funds whose balance change moved them to the other partition
///
/// `before` lists each touched fund with the partition it had before the
/// change. Funds that switched are appended to the tail of their new group in
/// their previous relative order, and both affected groups are reindexed.
pub fn settle_partitions(
    storage: &Storage,
    before: &[(FundId, FundPartition)],
) -> TimeBudgetResult<()> {
    let mut movers = Vec::new();
    for &(id, old_partition) in before {
        if let Some(fund) = storage.get_fund(id)? {
            if fund.partition() != old_partition {
                movers.push(fund);
            }
        }
    }
    if movers.is_empty() {
        return Ok(());
    }
    movers.sort_by(|a, b| (a.order, &a.name).cmp(&(b.order, &b.name)));

    let mut groups = Vec::new();
    for fund in &movers {
        for partition in FundPartition::all() {
            let group = (fund.budget_id, *partition);
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }

    for (budget_id, partition) in groups {
        let arrivals: Vec<FundId> = movers
            .iter()
            .filter(|f| f.budget_id == budget_id && f.partition() == partition)
            .map(|f| f.id)
            .collect();
        let arriving: HashSet<FundId> = arrivals.iter().copied().collect();

        let mut members: Vec<FundId> = group_members(storage, budget_id, partition)?
            .into_iter()
            .filter(|id| !arriving.contains(id))
            .collect();
        members.extend(arrivals);
        reindex(storage, &members)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;

    fn orders(storage: &Storage, budget: BudgetId, partition: FundPartition) -> Vec<(String, i32)> {
        storage
            .funds_in_group(budget, partition)
            .unwrap()
            .into_iter()
            .map(|f| (f.name, f.order))
            .collect()
    }

    fn setup(names: &[&str]) -> (Storage, BudgetId, Vec<FundId>) {
        let storage = Storage::in_memory();
        let budget = Budget::new("Work");
        let budget_id = budget.id;
        storage.insert(budget).unwrap();

        let mut ids = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let mut fund = Fund::new(*name, budget_id);
            fund.order = (i as i32) * 10;
            ids.push(fund.id);
            storage.insert(fund).unwrap();
        }
        (storage, budget_id, ids)
    }

    #[test]
    fn test_reindex_assigns_positions() {
        let (storage, budget, ids) = setup(&["A", "B", "C"]);
        let reversed: Vec<_> = ids.iter().rev().copied().collect();

        reindex(&storage, &reversed).unwrap();

        assert_eq!(
            orders(&storage, budget, FundPartition::Available),
            vec![("C".into(), 0), ("B".into(), 1), ("A".into(), 2)]
        );
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let (storage, _, ids) = setup(&["A", "B", "C"]);
        assert_eq!(reindex(&storage, &ids).unwrap(), 2);
        assert_eq!(reindex(&storage, &ids).unwrap(), 0);
    }

    #[test]
    fn test_close_gaps_after_delete() {
        let (storage, budget, ids) = setup(&["A", "B", "C", "D"]);
        storage.delete::<Fund>(ids[1]).unwrap();

        close_gaps(&storage, budget, FundPartition::Available).unwrap();

        let values: Vec<i32> = orders(&storage, budget, FundPartition::Available)
            .into_iter()
            .map(|(_, order)| order)
            .collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_move_member() {
        let mut members = vec!['a', 'b', 'c', 'd'];
        move_member(&mut members, 0, 2).unwrap();
        assert_eq!(members, vec!['b', 'c', 'a', 'd']);
        move_member(&mut members, 3, 0).unwrap();
        assert_eq!(members, vec!['d', 'b', 'c', 'a']);
        assert!(move_member(&mut members, 4, 0).is_err());
    }

    #[test]
    fn test_dense_orders_through_mixed_operations() {
        let (storage, budget, _) = setup(&["A", "B", "C", "D", "E"]);
        close_gaps(&storage, budget, FundPartition::Available).unwrap();

        for step in 0..6 {
            let mut members = group_members(&storage, budget, FundPartition::Available).unwrap();
            if step % 3 == 2 {
                storage.delete::<Fund>(members.remove(0)).unwrap();
            } else if step % 3 == 1 {
                let fund = Fund::new(format!("N{}", step), budget);
                members.insert(0, fund.id);
                storage.insert(fund).unwrap();
            } else {
                let last = members.len() - 1;
                move_member(&mut members, 0, last).unwrap();
            }
            reindex(&storage, &members).unwrap();

            let mut values: Vec<i32> = orders(&storage, budget, FundPartition::Available)
                .into_iter()
                .map(|(_, order)| order)
                .collect();
            values.sort_unstable();
            let expected: Vec<i32> = (0..values.len() as i32).collect();
            assert_eq!(values, expected, "after step {}", step);
        }
    }

    #[test]
    fn test_settle_moves_fund_to_tail_of_new_group() {
        let (storage, budget, ids) = setup(&["A", "B", "C"]);
        close_gaps(&storage, budget, FundPartition::Available).unwrap();

        let spent = Fund::new("Z", budget).with_reset_value(0);
        storage.insert(spent).unwrap();
        close_gaps(&storage, budget, FundPartition::Spent).unwrap();

        storage.update::<Fund, _, _>(ids[1], |f| f.adjust_balance(-1)).unwrap();
        settle_partitions(&storage, &[(ids[1], FundPartition::Available)]).unwrap();

        assert_eq!(
            orders(&storage, budget, FundPartition::Available),
            vec![("A".into(), 0), ("C".into(), 1)]
        );
        assert_eq!(
            orders(&storage, budget, FundPartition::Spent),
            vec![("Z".into(), 0), ("B".into(), 1)]
        );
    }
}
