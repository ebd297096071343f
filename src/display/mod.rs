//! Display formatting for terminal output
//!
//! Plain-text and table rendering of budgets, funds, settings and the audit
//! trail for the CLI.

pub mod budget;
pub mod fund;

pub use budget::{format_audit_entries, format_budget_list, format_settings};
pub use fund::{format_balance, format_duration, format_fund_details, format_fund_list, format_ratio};
