//! Entity store for time-budget
//!
//! Budgets, funds and legacy expenses live in flat arenas keyed by ID; every
//! relation between them is an ID. Mutations land in a working copy of the
//! graph. `save` hands the working copy to the persistence backend and only
//! makes it the committed state once the backend accepts it. A refused save,
//! or an explicit `rollback`, restores the last committed graph.

pub mod file_io;
pub mod json;
pub mod memory;
mod queries;

pub use file_io::{read_json, write_json_atomic};
pub use json::JsonPersistence;
pub use memory::MemoryPersistence;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::audit::{summarize_changes, AuditEntry, AuditLogger, EntityType};
use crate::config::{Settings, TimeBudgetPaths};
use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::models::{Budget, BudgetId, Expense, ExpenseId, Fund, FundId};

/// The whole entity graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreData {
    pub budgets: HashMap<BudgetId, Budget>,
    pub funds: HashMap<FundId, Fund>,
    pub expenses: HashMap<ExpenseId, Expense>,
    pub settings: Option<Settings>,
}

/// Physical storage behind [`Storage`]
pub trait Persistence {
    /// Read the last saved graph
    fn load(&self) -> TimeBudgetResult<StoreData>;

    /// Durably replace the saved graph; on error nothing is considered written
    fn persist(&self, data: &StoreData) -> TimeBudgetResult<()>;
}

/// A record type stored in one of the arenas
pub trait Record: Clone + Serialize {
    type Id: Copy + Eq + Hash + Display;

    /// Name used in "not found" errors
    const KIND: &'static str;
    const ENTITY: EntityType;

    fn id(&self) -> Self::Id;

    fn label(&self) -> Option<String> {
        None
    }

    fn table(data: &StoreData) -> &HashMap<Self::Id, Self>;
    fn table_mut(data: &mut StoreData) -> &mut HashMap<Self::Id, Self>;
}

impl Record for Budget {
    type Id = BudgetId;
    const KIND: &'static str = "Budget";
    const ENTITY: EntityType = EntityType::Budget;

    fn id(&self) -> BudgetId {
        self.id
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn table(data: &StoreData) -> &HashMap<BudgetId, Self> {
        &data.budgets
    }

    fn table_mut(data: &mut StoreData) -> &mut HashMap<BudgetId, Self> {
        &mut data.budgets
    }
}

impl Record for Fund {
    type Id = FundId;
    const KIND: &'static str = "Fund";
    const ENTITY: EntityType = EntityType::Fund;

    fn id(&self) -> FundId {
        self.id
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn table(data: &StoreData) -> &HashMap<FundId, Self> {
        &data.funds
    }

    fn table_mut(data: &mut StoreData) -> &mut HashMap<FundId, Self> {
        &mut data.funds
    }
}

impl Record for Expense {
    type Id = ExpenseId;
    const KIND: &'static str = "Expense";
    const ENTITY: EntityType = EntityType::Expense;

    fn id(&self) -> ExpenseId {
        self.id
    }

    fn label(&self) -> Option<String> {
        self.path.lines().last().map(str::to_string)
    }

    fn table(data: &StoreData) -> &HashMap<ExpenseId, Self> {
        &data.expenses
    }

    fn table_mut(data: &mut StoreData) -> &mut HashMap<ExpenseId, Self> {
        &mut data.expenses
    }
}

/// Transactional store: working graph, committed graph and queued audit entries
pub struct Storage {
    backend: Box<dyn Persistence>,
    working: RwLock<StoreData>,
    committed: RwLock<StoreData>,
    pending_audit: RwLock<Vec<AuditEntry>>,
    audit: Option<AuditLogger>,
}

impl Storage {
    /// Create an empty store over a backend; call [`Storage::load`] to read it
    pub fn new(backend: impl Persistence + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            working: RwLock::new(StoreData::default()),
            committed: RwLock::new(StoreData::default()),
            pending_audit: RwLock::new(Vec::new()),
            audit: None,
        }
    }

    /// Open the JSON-backed store under `paths`, with audit logging
    pub fn open(paths: &TimeBudgetPaths) -> TimeBudgetResult<Self> {
        paths.ensure_directories()?;
        let storage = Self::new(JsonPersistence::new(paths.clone()))
            .with_audit(AuditLogger::new(paths.audit_log()));
        storage.load()?;
        Ok(storage)
    }

    /// An empty store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::new(MemoryPersistence::new())
    }

    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Replace both graphs with what the backend holds
    pub fn load(&self) -> TimeBudgetResult<()> {
        let data = self.backend.load()?;
        debug!(
            budgets = data.budgets.len(),
            funds = data.funds.len(),
            expenses = data.expenses.len(),
            "store loaded"
        );
        *self.write()? = data.clone();
        *self.write_committed()? = data;
        self.pending()?.clear();
        Ok(())
    }

    fn read(&self) -> TimeBudgetResult<RwLockReadGuard<'_, StoreData>> {
        self.working
            .read()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> TimeBudgetResult<RwLockWriteGuard<'_, StoreData>> {
        self.working
            .write()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn read_committed(&self) -> TimeBudgetResult<RwLockReadGuard<'_, StoreData>> {
        self.committed
            .read()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_committed(&self) -> TimeBudgetResult<RwLockWriteGuard<'_, StoreData>> {
        self.committed
            .write()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn pending(&self) -> TimeBudgetResult<RwLockWriteGuard<'_, Vec<AuditEntry>>> {
        self.pending_audit
            .write()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    // Record operations

    /// Records matching `predicate`, sorted by `order`
    pub fn fetch<T, P, O>(&self, predicate: P, order: O) -> TimeBudgetResult<Vec<T>>
    where
        T: Record,
        P: Fn(&T) -> bool,
        O: FnMut(&T, &T) -> Ordering,
    {
        let data = self.read()?;
        let mut records: Vec<T> = T::table(&data)
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect();
        records.sort_by(order);
        Ok(records)
    }

    pub fn get<T: Record>(&self, id: T::Id) -> TimeBudgetResult<Option<T>> {
        Ok(T::table(&*self.read()?).get(&id).cloned())
    }

    /// Like [`Storage::get`] but a missing record is an error
    pub fn require<T: Record>(&self, id: T::Id) -> TimeBudgetResult<T> {
        self.get(id)?.ok_or_else(|| TimeBudgetError::NotFound {
            entity_type: T::KIND,
            identifier: id.to_string(),
        })
    }

    pub fn insert<T: Record>(&self, record: T) -> TimeBudgetResult<()> {
        let entry = AuditEntry::create(T::ENTITY, record.id().to_string(), record.label(), &record);
        T::table_mut(&mut *self.write()?).insert(record.id(), record);
        self.pending()?.push(entry);
        Ok(())
    }

    /// Mutate one record in place and return whatever `f` returns
    pub fn update<T, R, F>(&self, id: T::Id, f: F) -> TimeBudgetResult<R>
    where
        T: Record,
        F: FnOnce(&mut T) -> R,
    {
        let mut data = self.write()?;
        let record = T::table_mut(&mut data)
            .get_mut(&id)
            .ok_or_else(|| TimeBudgetError::NotFound {
                entity_type: T::KIND,
                identifier: id.to_string(),
            })?;

        let before = record.clone();
        let result = f(record);
        let after = record.clone();
        drop(data);

        if let (Ok(old), Ok(new)) = (serde_json::to_value(&before), serde_json::to_value(&after)) {
            if old != new {
                self.pending()?.push(AuditEntry::update(
                    T::ENTITY,
                    id.to_string(),
                    after.label(),
                    &before,
                    &after,
                    summarize_changes(&old, &new),
                ));
            }
        }

        Ok(result)
    }

    pub fn delete<T: Record>(&self, id: T::Id) -> TimeBudgetResult<Option<T>> {
        let removed = T::table_mut(&mut *self.write()?).remove(&id);
        if let Some(record) = &removed {
            self.pending()?.push(AuditEntry::delete(
                T::ENTITY,
                id.to_string(),
                record.label(),
                record,
            ));
        }
        Ok(removed)
    }

    // Settings singleton

    pub fn settings(&self) -> TimeBudgetResult<Option<Settings>> {
        Ok(self.read()?.settings.clone())
    }

    /// Replace the settings record; the stored data version is never lowered
    pub fn set_settings(&self, mut settings: Settings) -> TimeBudgetResult<()> {
        let mut data = self.write()?;
        if let Some(current) = &data.settings {
            settings.bump_data_version(current.data_version);
        }
        let before = data.settings.replace(settings.clone());
        drop(data);
        let entry = match before {
            None => Some(AuditEntry::create(EntityType::Settings, "settings", None, &settings)),
            Some(old) if old != settings => Some(AuditEntry::update(
                EntityType::Settings,
                "settings",
                None,
                &old,
                &settings,
                None,
            )),
            Some(_) => None,
        };
        if let Some(entry) = entry {
            self.pending()?.push(entry);
        }
        Ok(())
    }

    /// Fetch the settings record, creating and committing the default on first launch
    pub fn ensure_settings(&self) -> TimeBudgetResult<Settings> {
        if let Some(settings) = self.settings()? {
            return Ok(settings);
        }
        let settings = Settings::default();
        self.set_settings(settings.clone())?;
        self.save()?;
        info!("created default settings");
        Ok(settings)
    }

    // Transactions

    /// Whether the working graph differs from the committed one
    pub fn has_changes(&self) -> TimeBudgetResult<bool> {
        Ok(*self.read()? != *self.read_committed()?)
    }

    /// Commit the working graph
    ///
    /// On failure the working graph is rolled back and `PersistenceFailed`
    /// is returned; nothing from the attempted change remains visible.
    pub fn save(&self) -> TimeBudgetResult<()> {
        if !self.has_changes()? {
            self.pending()?.clear();
            return Ok(());
        }

        let snapshot = self.read()?.clone();
        if let Err(e) = self.backend.persist(&snapshot) {
            error!(error = %e, "save refused, rolling back");
            self.rollback()?;
            return Err(TimeBudgetError::PersistenceFailed(e.to_string()));
        }

        *self.write_committed()? = snapshot;
        let entries = std::mem::take(&mut *self.pending()?);
        debug!(changes = entries.len(), "changes committed");

        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log_batch(&entries) {
                warn!(error = %e, "failed to append audit entries");
            }
        }

        Ok(())
    }

    /// Discard every uncommitted change
    pub fn rollback(&self) -> TimeBudgetResult<()> {
        let committed = self.read_committed()?.clone();
        *self.write()? = committed;
        self.pending()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use tempfile::TempDir;

    #[test]
    fn test_insert_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TimeBudgetPaths::with_base_dir(temp_dir.path().to_path_buf());

        let storage = Storage::open(&paths).unwrap();
        let budget = Budget::new("Work");
        let fund = Fund::new("Email", budget.id);
        storage.insert(budget.clone()).unwrap();
        storage.insert(fund.clone()).unwrap();
        storage.save().unwrap();

        let reopened = Storage::open(&paths).unwrap();
        assert_eq!(reopened.get::<Budget>(budget.id).unwrap(), Some(budget));
        assert_eq!(reopened.get::<Fund>(fund.id).unwrap(), Some(fund));
    }

    #[test]
    fn test_rollback_discards_changes() {
        let storage = Storage::in_memory();
        let budget = Budget::new("Work");
        storage.insert(budget.clone()).unwrap();
        storage.save().unwrap();

        storage
            .update::<Budget, _, _>(budget.id, |b| b.name = "Play".into())
            .unwrap();
        assert!(storage.has_changes().unwrap());

        storage.rollback().unwrap();
        assert!(!storage.has_changes().unwrap());
        assert_eq!(storage.require::<Budget>(budget.id).unwrap().name, "Work");
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone());
        storage.insert(Budget::new("Work")).unwrap();
        storage.save().unwrap();

        backend.fail_next_save();
        storage.insert(Budget::new("Home")).unwrap();
        let result = storage.save();

        assert!(matches!(result, Err(TimeBudgetError::PersistenceFailed(_))));
        assert_eq!(storage.all_budgets().unwrap().len(), 1);
        assert_eq!(backend.saved_data().budgets.len(), 1);
    }

    #[test]
    fn test_fetch_filters_and_sorts() {
        let storage = Storage::in_memory();
        for name in ["Play", "Home", "Work"] {
            storage.insert(Budget::new(name)).unwrap();
        }

        let budgets: Vec<Budget> = storage
            .fetch(|b: &Budget| b.name != "Play", |a, b| a.name.cmp(&b.name))
            .unwrap();
        let names: Vec<_> = budgets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Work"]);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let storage = Storage::in_memory();
        let result = storage.update::<Fund, _, _>(FundId::new(), |_| ());
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_audit_written_only_after_commit() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone()).with_audit(logger.clone());

        storage.insert(Budget::new("Work")).unwrap();
        assert!(logger.read_all().unwrap().is_empty());
        storage.save().unwrap();

        backend.fail_next_save();
        storage.insert(Budget::new("Home")).unwrap();
        assert!(storage.save().is_err());

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_name.as_deref(), Some("Work"));
    }

    #[test]
    fn test_set_settings_keeps_data_version() {
        let storage = Storage::in_memory();
        storage
            .set_settings(Settings {
                data_version: 1,
                ..Settings::default()
            })
            .unwrap();

        storage
            .set_settings(Settings {
                short_period_secs: 15 * 60,
                ..Settings::default()
            })
            .unwrap();

        let settings = storage.settings().unwrap().unwrap();
        assert_eq!(settings.data_version, 1);
        assert_eq!(settings.short_period_secs, 15 * 60);
    }

    #[test]
    fn test_ensure_settings_creates_once() {
        let backend = MemoryPersistence::new();
        let storage = Storage::new(backend.clone());

        let settings = storage.ensure_settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(backend.save_count(), 1);

        storage.ensure_settings().unwrap();
        assert_eq!(backend.save_count(), 1);
    }
}
