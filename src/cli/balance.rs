//! Balance CLI commands: spend, earn, reset, apply-to-all and sub-budgets

use clap::ValueEnum;

use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::FundPartition;
use crate::services::BalanceService;
use crate::state::{AppState, FundAction};
use crate::storage::Storage;

use super::budget::render_top_budget;
use super::path::{resolve_budget, resolve_fund};

/// Which group an apply-to-all action touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    Available,
    Spent,
}

impl From<GroupArg> for FundPartition {
    fn from(group: GroupArg) -> Self {
        match group {
            GroupArg::Available => FundPartition::Available,
            GroupArg::Spent => FundPartition::Spent,
        }
    }
}

/// Actions that can be applied to every fund at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BulkAction {
    Spend,
    Earn,
    Reset,
}

impl From<BulkAction> for FundAction {
    fn from(action: BulkAction) -> Self {
        match action {
            BulkAction::Spend => FundAction::Spend,
            BulkAction::Earn => FundAction::Earn,
            BulkAction::Reset => FundAction::Reset,
        }
    }
}

/// Spend, earn or reset the fund at `path`
pub fn handle_fund_action(
    storage: &Storage,
    state: &AppState,
    action: FundAction,
    path: &str,
) -> TimeBudgetResult<()> {
    let (stack, fund) = resolve_fund(storage, path)?;
    state.budget_stack.set(stack.clone());
    state.fund_list_action.set(action);

    let service = BalanceService::new(storage, state);
    let updated = match action {
        FundAction::Spend => service.spend(fund.id, &stack)?,
        FundAction::Earn => service.earn(fund.id)?,
        FundAction::Reset => service.reset(fund.id)?,
        other => {
            return Err(TimeBudgetError::Validation(format!(
                "'{}' does not change a balance",
                other
            )))
        }
    };

    let mut fund_path = stack.via_funds();
    fund_path.push(updated.id);
    state.push_fund_path(fund_path);

    state
        .fund_list_action_detail
        .set(format!("{} {}: balance {}", action, updated.name, updated.balance()));
    println!("{}", state.fund_list_action_detail.get());
    Ok(())
}

/// Apply an action to every fund of the budget at `path`
pub fn handle_apply_all(
    storage: &Storage,
    state: &AppState,
    action: BulkAction,
    path: &str,
    group: Option<GroupArg>,
) -> TimeBudgetResult<()> {
    let stack = resolve_budget(storage, path)?;
    let budget_id = stack.top()?;
    state.budget_stack.set(stack);
    state.fund_list_action.set(action.into());

    let scope = group.map(FundPartition::from);
    let service = BalanceService::new(storage, state);
    let count = match action {
        BulkAction::Spend => service.spend_all(budget_id, scope)?,
        BulkAction::Earn => service.earn_all(budget_id, scope)?,
        BulkAction::Reset => service.reset_all(budget_id, scope)?,
    };

    println!("{} applied to {} funds", FundAction::from(action), count);
    print!("{}", render_top_budget(storage, state)?);
    Ok(())
}

/// Attach, detach or toggle the sub-budget of the fund at `path`
pub fn handle_sub_budget(
    storage: &Storage,
    state: &AppState,
    path: &str,
    name: Option<String>,
    detach: bool,
) -> TimeBudgetResult<()> {
    let (stack, fund) = resolve_fund(storage, path)?;
    state.budget_stack.set(stack);
    state.fund_list_action.set(FundAction::SubBudget);

    let service = BalanceService::new(storage, state);
    if detach {
        service.detach_sub_budget(fund.id)?;
        println!("{}: sub-budget detached", fund.name);
        return Ok(());
    }

    let attached = match name {
        Some(name) => Some(service.attach_sub_budget(fund.id, &name)?),
        None => service.toggle_sub_budget(fund.id)?,
    };
    match attached {
        Some(budget) => println!("{}: sub-budget is now '{}'", fund.name, budget.name),
        None => println!("{}: sub-budget detached", fund.name),
    }
    Ok(())
}
