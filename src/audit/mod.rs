//! Audit logging for time-budget
//!
//! Every committed create, update and delete of a budget, fund, expense or the
//! settings record is appended to `audit.log` with before/after values.
//!
//! - `AuditEntry`: one change, with timestamp, operation and entity identity.
//! - `AuditLogger`: appends entries to the JSONL log and reads them back.
//! - `summarize_changes`: one-line field diff used for update entries.

mod entry;
mod logger;

pub use entry::{summarize_changes, AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
