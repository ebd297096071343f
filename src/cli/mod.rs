//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod balance;
pub mod budget;
pub mod fund;
pub mod path;
pub mod settings;

pub use balance::{handle_apply_all, handle_fund_action, handle_sub_budget, BulkAction, GroupArg};
pub use budget::{handle_budget_command, BudgetCommands};
pub use fund::{handle_fund_command, FundCommands};
pub use settings::{
    handle_audit_command, handle_migrate_command, handle_settings_command, SettingsCommands,
};
