//! Fund display formatting
//!
//! Fund lists render as two tables, Available then Spent, each in its own
//! display order. Balances and ratios follow the display modes in settings.

use std::collections::HashMap;

use chrono::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::settings::{BalanceDisplayMode, RatioDisplayMode};
use crate::models::{Budget, BudgetId, Fund, FundPartition};
use crate::state::FundListSettings;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Shown when a figure does not fit in a duration
const OUT_OF_RANGE: &str = "overflow";

#[derive(Tabled)]
struct FundRow {
    #[tabled(rename = "#")]
    position: i32,
    #[tabled(rename = "Fund")]
    name: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Sub-budget")]
    sub_budget: String,
}

/// Format a span of time as e.g. `1h30m`, `45m` or `-2h`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_minutes();
    let sign = if total < 0 { "-" } else { "" };
    let (hours, minutes) = (total.abs() / 60, total.abs() % 60);
    match (hours, minutes) {
        (0, m) => format!("{}{}m", sign, m),
        (h, 0) => format!("{}{}h", sign, h),
        (h, m) => format!("{}{}h{}m", sign, h, m),
    }
}

/// `secs` as a formatted duration, or a marker when it is out of range
fn format_seconds(secs: Option<i64>) -> String {
    secs.and_then(Duration::try_seconds)
        .map(format_duration)
        .unwrap_or_else(|| OUT_OF_RANGE.to_string())
}

/// A balance as units or as time
pub fn format_balance(fund: &Fund, settings: &FundListSettings) -> String {
    match settings.balance_display_mode {
        BalanceDisplayMode::Unit => fund.balance().to_string(),
        BalanceDisplayMode::Time => {
            format_seconds(fund.balance().checked_mul(settings.short_period_secs))
        }
    }
}

/// The secondary figure shown next to a balance
pub fn format_ratio(fund: &Fund, settings: &FundListSettings) -> String {
    match settings.ratio_display_mode {
        RatioDisplayMode::Percentage => {
            if fund.reset_value <= 0 {
                "-".to_string()
            } else {
                fund.balance()
                    .checked_mul(100)
                    .map(|scaled| format!("{}%", scaled / fund.reset_value))
                    .unwrap_or_else(|| OUT_OF_RANGE.to_string())
            }
        }
        RatioDisplayMode::TimePerDay => {
            let long = i128::from(settings.long_period_secs.max(1));
            let per_day = i128::from(fund.reset_value)
                * i128::from(settings.short_period_secs)
                * i128::from(SECONDS_PER_DAY)
                / long;
            format!("{}/day", format_seconds(i64::try_from(per_day).ok()))
        }
        RatioDisplayMode::RechargeAmount => {
            format!("+{}", fund.reset_value.saturating_sub(fund.balance()).max(0))
        }
    }
}

fn fund_table(funds: &[&Fund], names: &HashMap<BudgetId, String>, settings: &FundListSettings) -> String {
    let rows = funds.iter().map(|fund| FundRow {
        position: fund.order,
        name: fund.name.clone(),
        balance: format_balance(fund, settings),
        ratio: format_ratio(fund, settings),
        sub_budget: fund
            .sub_budget_id
            .and_then(|id| names.get(&id).cloned())
            .unwrap_or_else(|| "-".to_string()),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Format a budget's funds as Available and Spent tables
pub fn format_fund_list(
    budget: &Budget,
    funds: &[Fund],
    budget_names: &HashMap<BudgetId, String>,
    settings: &FundListSettings,
) -> String {
    let mut output = format!("{}\n", budget.name);
    if funds.is_empty() {
        output.push_str("  (no funds)\n");
        return output;
    }

    for partition in FundPartition::all() {
        let group: Vec<&Fund> = funds.iter().filter(|f| f.partition() == *partition).collect();
        output.push('\n');
        output.push_str(&format!("{}:\n", partition));
        if group.is_empty() {
            output.push_str("  (none)\n");
        } else {
            output.push_str(&fund_table(&group, budget_names, settings));
            output.push('\n');
        }
    }

    output
}

/// Format fund details
pub fn format_fund_details(fund: &Fund, budget: &Budget, sub_budget: Option<&Budget>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Fund: {}\n", fund.name));
    output.push_str(&format!("  ID:          {}\n", fund.id));
    output.push_str(&format!("  Budget:      {}\n", budget.name));
    output.push_str(&format!("  Balance:     {}\n", fund.balance()));
    output.push_str(&format!("  Reset value: {}\n", fund.reset_value));
    output.push_str(&format!("  Group:       {} (#{})\n", fund.partition(), fund.order));
    if let Some(sub) = sub_budget {
        output.push_str(&format!("  Sub-budget:  {}\n", sub.name));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(90)), "1h30m");
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(2)), "2h");
        assert_eq!(format_duration(Duration::minutes(-30)), "-30m");
    }

    #[test]
    fn test_balance_modes() {
        let fund = Fund::new("Email", BudgetId::new()).with_reset_value(3);
        let mut settings = FundListSettings::default();
        assert_eq!(format_balance(&fund, &settings), "3");

        settings.balance_display_mode = BalanceDisplayMode::Time;
        assert_eq!(format_balance(&fund, &settings), "1h30m");
    }

    #[test]
    fn test_ratio_modes() {
        let fund = Fund::new("Email", BudgetId::new()).with_reset_value(4);
        let mut settings = FundListSettings::default();
        assert_eq!(format_ratio(&fund, &settings), "100%");

        settings.ratio_display_mode = RatioDisplayMode::TimePerDay;
        assert_eq!(format_ratio(&fund, &settings), "2h/day");

        settings.ratio_display_mode = RatioDisplayMode::RechargeAmount;
        assert_eq!(format_ratio(&fund, &settings), "+0");
    }

    #[test]
    fn test_huge_periods_do_not_panic() {
        let fund = Fund::new("Email", BudgetId::new()).with_reset_value(3);
        let mut settings = FundListSettings {
            short_period_secs: 10_000_000_000_000_000,
            long_period_secs: 10_000_000_000_000_000,
            ..FundListSettings::default()
        };

        settings.balance_display_mode = BalanceDisplayMode::Time;
        assert_eq!(format_balance(&fund, &settings), OUT_OF_RANGE);

        settings.long_period_secs = 1;
        settings.ratio_display_mode = RatioDisplayMode::TimePerDay;
        assert_eq!(format_ratio(&fund, &settings), format!("{}/day", OUT_OF_RANGE));
    }

    #[test]
    fn test_fund_list_sections() {
        let budget = Budget::new("Work");
        let funds = vec![
            Fund::new("Email", budget.id).with_reset_value(2),
            Fund::new("Meetings", budget.id).with_reset_value(0),
        ];
        let output = format_fund_list(&budget, &funds, &HashMap::new(), &FundListSettings::default());

        assert!(output.starts_with("Work\n"));
        let available = output.find("Available:").unwrap();
        let spent = output.find("Spent:").unwrap();
        assert!(available < spent);
        assert!(output[available..spent].contains("Email"));
        assert!(output[spent..].contains("Meetings"));
    }

    #[test]
    fn test_empty_budget() {
        let budget = Budget::new("Home");
        let output = format_fund_list(&budget, &[], &HashMap::new(), &FundListSettings::default());
        assert!(output.contains("(no funds)"));
    }
}
