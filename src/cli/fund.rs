//! Fund CLI commands

use clap::Subcommand;

use crate::display::format_fund_details;
use crate::error::TimeBudgetResult;
use crate::models::{FundPartition, ListPosition, DEFAULT_RESET_VALUE};
use crate::services::{FundService, HierarchyService};
use crate::state::AppState;
use crate::storage::Storage;

use super::path::{resolve_budget, resolve_fund};

/// Fund subcommands
#[derive(Subcommand)]
pub enum FundCommands {
    /// Add a fund to the Available group of a budget
    Add {
        /// Budget path, e.g. "Work" or "Work/Projects"
        budget: String,
        /// Fund name
        name: String,
        /// Insert at the top of the group instead of the bottom
        #[arg(long)]
        head: bool,
        /// Reset value (also the starting balance)
        #[arg(short, long)]
        reset: Option<i64>,
    },

    /// Show fund details
    Show {
        /// Fund path, e.g. "Work/Email"
        path: String,
    },

    /// Rename a fund (an empty name deletes it)
    Rename {
        /// Fund path
        path: String,
        /// New name
        name: String,
    },

    /// Delete a fund
    Delete {
        /// Fund path
        path: String,
    },

    /// Move a fund within its group
    Move {
        /// Budget path
        budget: String,
        /// Current position (0-based)
        from: usize,
        /// New position (0-based)
        to: usize,
        /// Reorder the Spent group instead of Available
        #[arg(long)]
        spent: bool,
    },

    /// Set the value a reset restores
    #[command(name = "set-reset")]
    SetReset {
        /// Fund path
        path: String,
        /// New reset value
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
}

/// Handle a fund command
pub fn handle_fund_command(
    storage: &Storage,
    state: &AppState,
    cmd: FundCommands,
) -> TimeBudgetResult<()> {
    let service = FundService::new(storage, state);

    match cmd {
        FundCommands::Add {
            budget,
            name,
            head,
            reset,
        } => {
            let stack = resolve_budget(storage, &budget)?;
            let position = if head {
                ListPosition::Head
            } else {
                ListPosition::Tail
            };
            let reset = reset.unwrap_or(DEFAULT_RESET_VALUE);
            match service.create_fund_with_reset(stack.top()?, &name, position, reset)? {
                Some(fund) => {
                    println!("Created fund: {}", fund.name);
                    println!("  Balance: {}", fund.balance());
                }
                None => println!("Empty name; nothing created."),
            }
        }

        FundCommands::Show { path } => {
            let (_, fund) = resolve_fund(storage, &path)?;
            let hierarchy = HierarchyService::new(storage);
            let budget = hierarchy.owning_budget(fund.id)?;
            let sub_budget = hierarchy.sub_budget(fund.id)?;
            print!("{}", format_fund_details(&fund, &budget, sub_budget.as_ref()));
        }

        FundCommands::Rename { path, name } => {
            let (_, fund) = resolve_fund(storage, &path)?;
            match service.rename_fund(fund.id, &name)? {
                Some(renamed) => println!("Renamed fund: {} -> {}", fund.name, renamed.name),
                None => println!("Deleted fund: {}", fund.name),
            }
        }

        FundCommands::Delete { path } => {
            let (_, fund) = resolve_fund(storage, &path)?;
            let deleted = service.delete_fund(fund.id)?;
            println!("Deleted fund: {}", deleted.name);
        }

        FundCommands::Move {
            budget,
            from,
            to,
            spent,
        } => {
            let stack = resolve_budget(storage, &budget)?;
            let partition = if spent {
                FundPartition::Spent
            } else {
                FundPartition::Available
            };
            service.move_fund(stack.top()?, partition, from, to)?;
            println!("Moved {} fund #{} to #{}", partition, from, to);
        }

        FundCommands::SetReset { path, value } => {
            let (_, fund) = resolve_fund(storage, &path)?;
            let fund = service.set_reset_value(fund.id, value)?;
            println!("{}: reset value is now {}", fund.name, fund.reset_value);
        }
    }

    Ok(())
}
