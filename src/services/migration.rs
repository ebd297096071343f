//! Legacy data migration
//!
//! Data version 0 stored each expense against a fund and a half-hour slot of
//! the day. Version 1 folds the fund name into the expense's breadcrumb path and
//! the slot into its timestamp. The whole batch, including the version bump,
//! is one commit; records already in the new shape are skipped, so an
//! interrupted run is safe to repeat.

use tracing::{error, info, warn};

use crate::config::settings::CURRENT_DATA_VERSION;
use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{Expense, Fund, NO_TIME_SLOT};
use crate::storage::Storage;

/// Outcome of a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records rewritten in this run
    pub migrated: usize,
    /// Legacy records left alone because their fund no longer exists
    pub skipped: usize,
    /// Data version after the run
    pub data_version: u32,
}

impl MigrationReport {
    /// Whether anything was rewritten
    pub fn did_work(&self) -> bool {
        self.migrated > 0
    }
}

pub struct MigrationService<'a> {
    storage: &'a Storage,
}

impl<'a> MigrationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Bring stored data up to the current data version
    ///
    /// On failure nothing is committed, the data version stays where it was,
    /// and the next startup tries again.
    pub fn run(&self) -> TimeBudgetResult<MigrationReport> {
        let settings = self
            .storage
            .ensure_settings()
            .map_err(|e| self.failed(e))?;
        if settings.data_version >= CURRENT_DATA_VERSION {
            return Ok(MigrationReport {
                data_version: settings.data_version,
                ..Default::default()
            });
        }

        let report = self.migrate_expenses().map_err(|e| self.failed(e))?;
        info!(
            migrated = report.migrated,
            skipped = report.skipped,
            data_version = report.data_version,
            "data migration complete"
        );
        Ok(report)
    }

    /// Discard the partial batch and wrap the cause
    fn failed(&self, cause: TimeBudgetError) -> TimeBudgetError {
        error!(error = %cause, "data migration failed");
        if let Err(e) = self.storage.rollback() {
            warn!(error = %e, "rollback after failed migration also failed");
        }
        TimeBudgetError::MigrationFailed(cause.to_string())
    }

    fn migrate_expenses(&self) -> TimeBudgetResult<MigrationReport> {
        let mut report = MigrationReport::default();

        for expense in self.storage.expenses()? {
            if !expense.needs_migration() {
                continue;
            }
            let Some(fund_id) = expense.fund_id else {
                continue;
            };
            let Some(fund) = self.storage.get::<Fund>(fund_id)? else {
                warn!(expense = %expense.id, fund = %fund_id, "legacy expense refers to a missing fund");
                report.skipped += 1;
                continue;
            };

            let offset = expense.slot_offset();
            self.storage.update::<Expense, _, _>(expense.id, |e| {
                e.path.push('\n');
                e.path.push_str(&fund.name);
                e.fund_id = None;
                e.when += offset;
                e.time_slot = NO_TIME_SLOT;
            })?;
            report.migrated += 1;
        }

        let mut settings = self.storage.ensure_settings()?;
        settings.bump_data_version(CURRENT_DATA_VERSION);
        report.data_version = settings.data_version;
        self.storage.set_settings(settings)?;
        self.storage.save()?;

        Ok(report)
    }
}
