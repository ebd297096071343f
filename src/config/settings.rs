//! User settings for time-budget
//!
//! The settings record is a singleton persisted in `config.json`. Besides the
//! display preferences it carries `data_version`, which gates one-shot data
//! migrations and never decreases.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::paths::TimeBudgetPaths;
use crate::error::TimeBudgetError;
use crate::storage::file_io::{read_json_required, write_json_atomic};

/// Data version after the legacy expense migration
pub const CURRENT_DATA_VERSION: u32 = 1;

/// Longest accepted period, one leap year in seconds
pub const MAX_PERIOD_SECS: i64 = 366 * 24 * 60 * 60;

/// How fund balances are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDisplayMode {
    /// Raw unit counts
    #[default]
    Unit,
    /// Units converted to time using the short period
    Time,
}

/// How a fund's balance ratio is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RatioDisplayMode {
    #[default]
    Percentage,
    TimePerDay,
    RechargeAmount,
}

impl fmt::Display for BalanceDisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "unit"),
            Self::Time => write!(f, "time"),
        }
    }
}

impl FromStr for BalanceDisplayMode {
    type Err = TimeBudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unit" => Ok(Self::Unit),
            "time" => Ok(Self::Time),
            other => Err(TimeBudgetError::Validation(format!(
                "Unknown balance display mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RatioDisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => write!(f, "percentage"),
            Self::TimePerDay => write!(f, "time_per_day"),
            Self::RechargeAmount => write!(f, "recharge_amount"),
        }
    }
}

impl FromStr for RatioDisplayMode {
    type Err = TimeBudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "percentage" => Ok(Self::Percentage),
            "time_per_day" => Ok(Self::TimePerDay),
            "recharge_amount" => Ok(Self::RechargeAmount),
            other => Err(TimeBudgetError::Validation(format!(
                "Unknown ratio display mode '{}'",
                other
            ))),
        }
    }
}

/// The settings singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Length of one unit of time, in seconds
    #[serde(default = "default_short_period")]
    pub short_period_secs: i64,

    /// Recharge period, in seconds
    #[serde(default = "default_long_period")]
    pub long_period_secs: i64,

    #[serde(default)]
    pub balance_display_mode: BalanceDisplayMode,

    #[serde(default)]
    pub ratio_display_mode: RatioDisplayMode,

    /// Migration gate; only ever increases
    #[serde(default)]
    pub data_version: u32,
}

fn default_short_period() -> i64 {
    30 * 60
}

fn default_long_period() -> i64 {
    24 * 60 * 60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            short_period_secs: default_short_period(),
            long_period_secs: default_long_period(),
            balance_display_mode: BalanceDisplayMode::default(),
            ratio_display_mode: RatioDisplayMode::default(),
            data_version: 0,
        }
    }
}

impl Settings {
    pub fn short_period(&self) -> Duration {
        Duration::seconds(self.short_period_secs)
    }

    pub fn long_period(&self) -> Duration {
        Duration::seconds(self.long_period_secs)
    }

    /// Raise the data version; lower values are ignored
    pub fn bump_data_version(&mut self, version: u32) {
        self.data_version = self.data_version.max(version);
    }

    /// Validate period lengths
    pub fn validate(&self) -> Result<(), TimeBudgetError> {
        if self.short_period_secs <= 0 {
            return Err(TimeBudgetError::Validation(
                "Short period must be positive".into(),
            ));
        }
        if self.long_period_secs < self.short_period_secs {
            return Err(TimeBudgetError::Validation(
                "Long period cannot be shorter than the short period".into(),
            ));
        }
        if self.long_period_secs > MAX_PERIOD_SECS {
            return Err(TimeBudgetError::Validation(format!(
                "Periods cannot be longer than {} seconds",
                MAX_PERIOD_SECS
            )));
        }
        Ok(())
    }

    /// Load the settings record, or `None` before first launch
    pub fn load(paths: &TimeBudgetPaths) -> Result<Option<Self>, TimeBudgetError> {
        let path = paths.settings_file();
        if !path.exists() {
            return Ok(None);
        }
        read_json_required(&path)
            .map(Some)
            .map_err(|e| TimeBudgetError::Config(format!("Failed to load settings: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TimeBudgetPaths) -> Result<(), TimeBudgetError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }
}
