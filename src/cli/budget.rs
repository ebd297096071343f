//! Budget CLI commands

use std::collections::{HashMap, HashSet};

use clap::Subcommand;

use crate::display::format_budget_list;
use crate::display::fund::format_fund_list;
use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::services::HierarchyService;
use crate::state::AppState;
use crate::storage::Storage;

use super::path::resolve_budget;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// List all budgets
    List,

    /// Create a new top-level budget
    Create {
        /// Budget name
        name: String,
    },

    /// Show the funds of a budget
    Show {
        /// Budget path, e.g. "Work" or "Work/Projects"
        path: String,
    },

    /// Delete a budget and all of its funds
    Delete {
        /// Budget name
        name: String,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    state: &AppState,
    cmd: BudgetCommands,
) -> TimeBudgetResult<()> {
    let service = HierarchyService::new(storage).with_state(state);

    match cmd {
        BudgetCommands::List => {
            let budgets = storage.all_budgets()?;
            let roots: HashSet<_> = storage.root_budgets()?.into_iter().map(|b| b.id).collect();
            print!("{}", format_budget_list(&budgets, &roots));
        }

        BudgetCommands::Create { name } => {
            let budget = service.create_budget(&name)?;
            println!("Created budget: {}", budget.name);
            println!("  ID: {}", budget.id);
        }

        BudgetCommands::Show { path } => {
            let stack = resolve_budget(storage, &path)?;
            state.budget_stack.set(stack);
            print!("{}", render_top_budget(storage, state)?);
        }

        BudgetCommands::Delete { name } => {
            let budget = storage
                .budget_by_name(&name)?
                .ok_or_else(|| TimeBudgetError::budget_not_found(&name))?;
            let fund_count = storage.funds_in_budget(budget.id)?.len();
            service.delete_budget(budget.id)?;
            println!("Deleted budget: {} ({} funds)", budget.name, fund_count);
        }
    }

    Ok(())
}

/// Render the budget on top of the state's stack as fund tables
pub fn render_top_budget(storage: &Storage, state: &AppState) -> TimeBudgetResult<String> {
    let top = state.budget_stack.with(|stack| stack.top())?;
    let budget = storage
        .get_budget(top)?
        .ok_or_else(|| TimeBudgetError::budget_not_found(top.to_string()))?;
    let funds = storage.funds_in_budget(top)?;
    let names: HashMap<_, _> = storage
        .all_budgets()?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();

    let mut output = format!("[{}]\n", state.title(storage)?);
    output.push_str(&format_fund_list(
        &budget,
        &funds,
        &names,
        &state.fund_list_settings.get(),
    ));
    Ok(output)
}
