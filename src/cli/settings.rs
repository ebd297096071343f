//! Settings, migration and audit CLI commands

use clap::Subcommand;

use crate::config::settings::{BalanceDisplayMode, RatioDisplayMode};
use crate::display::{format_audit_entries, format_settings};
use crate::error::{TimeBudgetError, TimeBudgetResult};
use crate::services::MigrationService;
use crate::state::AppState;
use crate::storage::Storage;

/// Settings subcommands
#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show the current settings
    Show,

    /// Change one or more settings
    Set {
        /// Length of one unit, in seconds
        #[arg(long)]
        short_period: Option<i64>,
        /// Recharge period, in seconds
        #[arg(long)]
        long_period: Option<i64>,
        /// Balance display: unit or time
        #[arg(long)]
        balance_display: Option<BalanceDisplayMode>,
        /// Ratio display: percentage, time_per_day or recharge_amount
        #[arg(long)]
        ratio_display: Option<RatioDisplayMode>,
    },
}

/// Handle a settings command
pub fn handle_settings_command(
    storage: &Storage,
    state: &AppState,
    cmd: SettingsCommands,
) -> TimeBudgetResult<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = storage.ensure_settings()?;
            println!("Settings:");
            print!("{}", format_settings(&settings));
        }

        SettingsCommands::Set {
            short_period,
            long_period,
            balance_display,
            ratio_display,
        } => {
            let mut settings = storage.ensure_settings()?;
            if let Some(secs) = short_period {
                settings.short_period_secs = secs;
            }
            if let Some(secs) = long_period {
                settings.long_period_secs = secs;
            }
            if let Some(mode) = balance_display {
                settings.balance_display_mode = mode;
            }
            if let Some(mode) = ratio_display {
                settings.ratio_display_mode = mode;
            }
            settings.validate()?;

            storage.set_settings(settings.clone())?;
            storage.save()?;
            state.load_settings(storage)?;

            println!("Settings updated:");
            print!("{}", format_settings(&settings));
        }
    }

    Ok(())
}

/// Run the legacy data migration on demand
pub fn handle_migrate_command(storage: &Storage) -> TimeBudgetResult<()> {
    let report = MigrationService::new(storage).run()?;
    if report.did_work() || report.skipped > 0 {
        println!(
            "Migrated {} expenses ({} skipped); data version {}",
            report.migrated, report.skipped, report.data_version
        );
    } else {
        println!("Data is up to date (version {})", report.data_version);
    }
    Ok(())
}

/// Show the most recent audit entries
pub fn handle_audit_command(storage: &Storage, count: usize) -> TimeBudgetResult<()> {
    let logger = storage
        .audit_logger()
        .ok_or_else(|| TimeBudgetError::Config("Audit log is not enabled".into()))?;
    print!("{}", format_audit_entries(&logger.read_recent(count)?));
    Ok(())
}
