//! time-budget - spend your time like money
//!
//! Time is tracked as funds: named counters that are spent one unit at a time
//! and reset once per period. Funds live in budgets, and a fund can open into a
//! sub-budget of its own, so spending deep inside a nested budget also spends
//! every fund on the way down.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths and the settings record
//! - `error`: Custom error types
//! - `models`: Budgets, funds, legacy expenses and the navigation stack
//! - `storage`: Transactional entity store with JSON persistence
//! - `services`: Ordering, hierarchy, balance and migration logic
//! - `state`: Observable application state for the presentation layer
//! - `audit`: Audit logging of committed changes
//! - `cli`, `display`: Command-line front end
//!
//! # Example
//!
//! ```rust,ignore
//! use timebudget::config::TimeBudgetPaths;
//! use timebudget::services::HierarchyService;
//! use timebudget::storage::Storage;
//!
//! let storage = Storage::open(&TimeBudgetPaths::new()?)?;
//! let work = HierarchyService::new(&storage).create_budget("Work")?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use error::TimeBudgetError;
