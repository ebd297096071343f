//! In-memory persistence backend
//!
//! Holds the saved graph in memory. Handles are cheap clones sharing one state,
//! so a caller can keep a handle after passing one to [`Storage`](super::Storage)
//! and make the next save fail.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{TimeBudgetError, TimeBudgetResult};

use super::{Persistence, StoreData};

#[derive(Debug, Default)]
struct MemoryState {
    data: StoreData,
    fail_next_save: bool,
    save_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already saved graph
    pub fn with_data(data: StoreData) -> Self {
        let backend = Self::new();
        if let Ok(mut state) = backend.state.lock() {
            state.data = data;
        }
        backend
    }

    fn lock(&self) -> TimeBudgetResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| TimeBudgetError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    /// Refuse the next `persist` call
    pub fn fail_next_save(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_save = true;
        }
    }

    /// The last successfully saved graph
    pub fn saved_data(&self) -> StoreData {
        self.state
            .lock()
            .map(|state| state.data.clone())
            .unwrap_or_default()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.state.lock().map(|state| state.save_count).unwrap_or(0)
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> TimeBudgetResult<StoreData> {
        Ok(self.lock()?.data.clone())
    }

    fn persist(&self, data: &StoreData) -> TimeBudgetResult<()> {
        let mut state = self.lock()?;
        if state.fail_next_save {
            state.fail_next_save = false;
            return Err(TimeBudgetError::Storage("simulated write failure".into()));
        }
        state.data = data.clone();
        state.save_count += 1;
        Ok(())
    }
}
