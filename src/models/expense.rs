//! Legacy expense records
//!
//! Older data files recorded time spent as an expense tied to a fund and to a
//! half-hour slot of the day. Current data keeps only the breadcrumb path and an
//! exact timestamp; see `services::migration`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ExpenseId, FundId};

/// Length of one legacy day slot
pub const LEGACY_SLOT_MINUTES: i64 = 30;

/// Slot value of a record that no longer uses slots
pub const NO_TIME_SLOT: i32 = -1;

/// A recorded expenditure of time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier
    pub id: ExpenseId,

    /// Legacy association to the fund the time was spent from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_id: Option<FundId>,

    /// Legacy index of the half-hour slot within the day of `when`
    #[serde(default = "default_time_slot")]
    pub time_slot: i32,

    /// Newline-separated breadcrumb of budget and fund names
    #[serde(default)]
    pub path: String,

    /// When the time was spent
    pub when: DateTime<Utc>,
}

fn default_time_slot() -> i32 {
    NO_TIME_SLOT
}

impl Expense {
    /// Create a legacy record as older versions wrote it
    pub fn legacy(fund_id: FundId, time_slot: i32, path: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            id: ExpenseId::new(),
            fund_id: Some(fund_id),
            time_slot,
            path: path.into(),
            when,
        }
    }

    /// Whether this record still carries the legacy slot/fund fields
    pub fn needs_migration(&self) -> bool {
        self.fund_id.is_some() && self.time_slot != NO_TIME_SLOT
    }

    /// Offset of the legacy slot from the anchor date
    pub fn slot_offset(&self) -> Duration {
        Duration::minutes(i64::from(self.time_slot.max(0)) * LEGACY_SLOT_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slot_offset() {
        let when = Utc.with_ymd_and_hms(2020, 7, 1, 0, 0, 0).unwrap();
        let expense = Expense::legacy(FundId::new(), 3, "Work", when);
        assert_eq!(expense.slot_offset(), Duration::minutes(90));
        assert!(expense.needs_migration());
    }

    #[test]
    fn test_missing_slot_defaults_to_sentinel() {
        let json = r#"{"id":"550e8400-e29b-41d4-a716-446655440000","path":"Work","when":"2020-07-01T00:00:00Z"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.time_slot, NO_TIME_SLOT);
        assert!(!expense.needs_migration());
    }
}
