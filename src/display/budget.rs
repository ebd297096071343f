//! Budget display formatting

use std::collections::HashSet;

use crate::audit::AuditEntry;
use crate::config::Settings;
use crate::models::{Budget, BudgetId};

/// Format all budgets, marking the roots of the budget tree
pub fn format_budget_list(budgets: &[Budget], roots: &HashSet<BudgetId>) -> String {
    if budgets.is_empty() {
        return "No budgets found.\n\nRun 'timebudget budget create <name>' to add one.\n"
            .to_string();
    }

    let mut output = String::from("Budgets:\n");
    for budget in budgets {
        let marker = if roots.contains(&budget.id) { "" } else { " (sub-budget)" };
        output.push_str(&format!("  {}{}\n", budget.name, marker));
    }
    output
}

pub fn format_settings(settings: &Settings) -> String {
    let mut output = String::new();
    output.push_str(&format!("  Short period:     {}s\n", settings.short_period_secs));
    output.push_str(&format!("  Long period:      {}s\n", settings.long_period_secs));
    output.push_str(&format!("  Balance display:  {}\n", settings.balance_display_mode));
    output.push_str(&format!("  Ratio display:    {}\n", settings.ratio_display_mode));
    output.push_str(&format!("  Data version:     {}\n", settings.data_version));
    output
}

pub fn format_audit_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries.\n".to_string();
    }
    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry.format_human_readable());
        output.push('\n');
    }
    output
}
