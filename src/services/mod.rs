//! Service layer for time-budget
//!
//! Services are the only code that mutates the entity graph. Each public
//! operation is one unit: mutate the working graph, commit, and only then
//! notify the state container. Anything that fails before the commit is rolled
//! back, so callers never observe a partial change.

pub mod balance;
pub mod fund;
pub mod hierarchy;
pub mod migration;
pub mod ordering;

pub use balance::BalanceService;
pub use fund::FundService;
pub use hierarchy::HierarchyService;
pub use migration::{MigrationReport, MigrationService};

use tracing::error;

use crate::error::TimeBudgetResult;
use crate::storage::Storage;

/// Run `mutate` against the working graph and commit it as one unit
///
/// If `mutate` fails the working graph is rolled back. A refused save is rolled
/// back by [`Storage::save`] itself.
pub(crate) fn transact<R, F>(storage: &Storage, operation: &'static str, mutate: F) -> TimeBudgetResult<R>
where
    F: FnOnce() -> TimeBudgetResult<R>,
{
    let result = match mutate() {
        Ok(result) => result,
        Err(e) => {
            error!(operation, error = %e, "operation aborted, rolling back");
            storage.rollback()?;
            return Err(e);
        }
    };

    if let Err(e) = storage.save() {
        error!(operation, error = %e, "commit failed");
        return Err(e);
    }

    Ok(result)
}
