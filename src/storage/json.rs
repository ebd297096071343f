//! JSON file persistence
//!
//! Budgets, funds and legacy expenses go to `data/budgets.json`; the settings
//! singleton goes to `config.json`. Each file is replaced atomically.
//!
//! A commit writes `config.json` first and only when the settings changed, so
//! the rename of `budgets.json` is the single point at which a commit lands.
//! If that rename fails the previous settings file is put back.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Settings, TimeBudgetPaths};
use crate::error::TimeBudgetResult;
use crate::models::{Budget, Expense, Fund};

use super::file_io::{read_json, write_json_atomic};
use super::{Persistence, StoreData};

/// On-disk layout of budgets.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetFile {
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub funds: Vec<Fund>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expenses: Vec<Expense>,
}

impl BudgetFile {
    /// Flatten the arenas into a stable, diff-friendly order
    fn from_store(data: &StoreData) -> Self {
        let mut budgets: Vec<_> = data.budgets.values().cloned().collect();
        budgets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut funds: Vec<_> = data.funds.values().cloned().collect();
        funds.sort_by_key(|f| (f.budget_id, f.partition() as u8, f.order, f.id));

        let mut expenses: Vec<_> = data.expenses.values().cloned().collect();
        expenses.sort_by_key(|e| (e.when, e.id));

        Self {
            budgets,
            funds,
            expenses,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonPersistence {
    paths: TimeBudgetPaths,
}

impl JsonPersistence {
    pub fn new(paths: TimeBudgetPaths) -> Self {
        Self { paths }
    }
}

impl Persistence for JsonPersistence {
    fn load(&self) -> TimeBudgetResult<StoreData> {
        let file: BudgetFile = read_json(self.paths.budgets_file())?;

        Ok(StoreData {
            budgets: file.budgets.into_iter().map(|b| (b.id, b)).collect(),
            funds: file.funds.into_iter().map(|f| (f.id, f)).collect(),
            expenses: file.expenses.into_iter().map(|e| (e.id, e)).collect(),
            settings: Settings::load(&self.paths)?,
        })
    }

    fn persist(&self, data: &StoreData) -> TimeBudgetResult<()> {
        let previous = Settings::load(&self.paths)?;
        let settings_changed = data.settings.is_some() && data.settings != previous;

        if settings_changed {
            if let Some(settings) = &data.settings {
                settings.save(&self.paths)?;
                debug!("settings file replaced");
            }
        }

        if let Err(e) = write_json_atomic(self.paths.budgets_file(), &BudgetFile::from_store(data))
        {
            if settings_changed {
                self.restore_settings(previous.as_ref());
            }
            return Err(e);
        }
        Ok(())
    }
}

impl JsonPersistence {
    /// Put the settings file back the way it was before a refused commit
    fn restore_settings(&self, previous: Option<&Settings>) {
        let restored = match previous {
            Some(settings) => settings.save(&self.paths),
            None => fs::remove_file(self.paths.settings_file()).map_err(Into::into),
        };
        if let Err(e) = restored {
            warn!(error = %e, "could not restore settings after a failed commit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimeBudgetError;
    use crate::models::FundId;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend =
            JsonPersistence::new(TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf()));

        let data = backend.load().unwrap();
        assert_eq!(data, StoreData::default());
    }

    #[test]
    fn test_persist_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonPersistence::new(paths.clone());

        let mut data = StoreData::default();
        let budget = Budget::new("Work");
        let fund = Fund::new("Email", budget.id).with_reset_value(5);
        data.budgets.insert(budget.id, budget);
        data.funds.insert(fund.id, fund);
        data.settings = Some(Settings::default());

        backend.persist(&data).unwrap();

        assert!(paths.budgets_file().exists());
        assert!(paths.settings_file().exists());
        assert_eq!(backend.load().unwrap(), data);
    }

    fn committed_store(paths: &TimeBudgetPaths) -> (Storage, FundId) {
        let storage = Storage::open(paths).unwrap();
        storage.ensure_settings().unwrap();
        let budget = Budget::new("Work");
        let fund = Fund::new("Email", budget.id).with_reset_value(5);
        let fund_id = fund.id;
        storage.insert(budget).unwrap();
        storage.insert(fund).unwrap();
        storage.save().unwrap();
        (storage, fund_id)
    }

    #[test]
    fn test_unwritable_settings_leave_disk_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let (storage, fund_id) = committed_store(&paths);

        fs::create_dir(paths.settings_file().with_extension("json.tmp")).unwrap();

        let mut settings = storage.settings().unwrap().unwrap();
        settings.short_period_secs = 15 * 60;
        storage.set_settings(settings).unwrap();
        storage
            .update::<Fund, _, _>(fund_id, |f| f.adjust_balance(-1))
            .unwrap();

        let result = storage.save();
        assert!(matches!(result, Err(TimeBudgetError::PersistenceFailed(_))));
        assert_eq!(storage.require::<Fund>(fund_id).unwrap().balance(), 5);

        let reopened = Storage::open(&paths).unwrap();
        assert_eq!(reopened.require::<Fund>(fund_id).unwrap().balance(), 5);
        assert_eq!(
            reopened.settings().unwrap().unwrap().short_period_secs,
            30 * 60
        );
    }

    #[test]
    fn test_unchanged_settings_are_not_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let (storage, fund_id) = committed_store(&paths);

        fs::create_dir(paths.settings_file().with_extension("json.tmp")).unwrap();

        storage
            .update::<Fund, _, _>(fund_id, |f| f.adjust_balance(-1))
            .unwrap();
        storage.save().unwrap();

        let reopened = Storage::open(&paths).unwrap();
        assert_eq!(reopened.require::<Fund>(fund_id).unwrap().balance(), 4);
    }

    #[test]
    fn test_failed_budgets_write_restores_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let (storage, fund_id) = committed_store(&paths);

        fs::create_dir(paths.budgets_file().with_extension("json.tmp")).unwrap();

        let mut settings = storage.settings().unwrap().unwrap();
        settings.long_period_secs = 7 * 24 * 60 * 60;
        storage.set_settings(settings).unwrap();
        storage
            .update::<Fund, _, _>(fund_id, |f| f.adjust_balance(-1))
            .unwrap();
        assert!(storage.save().is_err());

        assert_eq!(
            Settings::load(&paths).unwrap().unwrap().long_period_secs,
            24 * 60 * 60
        );
    }
}
