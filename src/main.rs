use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use timebudget::cli::{
    handle_apply_all, handle_audit_command, handle_budget_command, handle_fund_action,
    handle_fund_command, handle_migrate_command, handle_settings_command, handle_sub_budget,
    BudgetCommands, BulkAction, FundCommands, GroupArg, SettingsCommands,
};
use timebudget::config::paths::{TimeBudgetPaths, DATA_DIR_ENV};
use timebudget::display::format_settings;
use timebudget::services::MigrationService;
use timebudget::state::{AppState, FundAction};
use timebudget::storage::Storage;

#[derive(Parser)]
#[command(
    name = "timebudget",
    version,
    about = "Budget your time as spendable funds",
    long_about = "time-budget tracks discretionary time as funds that are spent \
                  one unit at a time. Funds belong to budgets and can open into \
                  sub-budgets; spending inside a sub-budget also spends the funds \
                  that lead to it."
)]
struct Cli {
    /// Data directory (defaults to the platform config directory)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Fund management commands
    #[command(subcommand)]
    Fund(FundCommands),

    /// Spend one unit of a fund (and of every fund leading to it)
    Spend {
        /// Fund path, e.g. "Work/Projects/Code"
        path: String,
    },

    /// Add one unit to a fund
    Earn {
        /// Fund path
        path: String,
    },

    /// Restore a fund to its reset value
    Reset {
        /// Fund path
        path: String,
    },

    /// Apply an action to every fund of a budget
    All {
        /// Action to apply
        #[arg(value_enum)]
        action: BulkAction,
        /// Budget path
        budget: String,
        /// Only touch one group
        #[arg(long, value_enum)]
        only: Option<GroupArg>,
    },

    /// Toggle, attach or detach a fund's sub-budget
    #[command(name = "sub-budget")]
    SubBudget {
        /// Fund path
        path: String,
        /// Attach the budget with this name (created if missing)
        #[arg(short, long, conflicts_with = "detach")]
        name: Option<String>,
        /// Detach the current sub-budget
        #[arg(long)]
        detach: bool,
    },

    /// Settings commands
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Run the legacy data migration
    Migrate,

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => TimeBudgetPaths::with_base_dir(dir),
        None => TimeBudgetPaths::new()?,
    };

    let storage = Storage::open(&paths)?;
    storage.ensure_settings()?;

    // A failed migration is retried on the next start.
    if let Err(e) = MigrationService::new(&storage).run() {
        warn!(error = %e, "continuing without migrating legacy data");
    }

    let state = AppState::new();
    state.load_settings(&storage)?;

    match cli.command {
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, &state, cmd)?,
        Some(Commands::Fund(cmd)) => handle_fund_command(&storage, &state, cmd)?,
        Some(Commands::Spend { path }) => {
            handle_fund_action(&storage, &state, FundAction::Spend, &path)?
        }
        Some(Commands::Earn { path }) => {
            handle_fund_action(&storage, &state, FundAction::Earn, &path)?
        }
        Some(Commands::Reset { path }) => {
            handle_fund_action(&storage, &state, FundAction::Reset, &path)?
        }
        Some(Commands::All {
            action,
            budget,
            only,
        }) => handle_apply_all(&storage, &state, action, &budget, only)?,
        Some(Commands::SubBudget { path, name, detach }) => {
            handle_sub_budget(&storage, &state, &path, name, detach)?
        }
        Some(Commands::Settings(cmd)) => handle_settings_command(&storage, &state, cmd)?,
        Some(Commands::Migrate) => handle_migrate_command(&storage)?,
        Some(Commands::Audit { count }) => handle_audit_command(&storage, count)?,
        Some(Commands::Init) => {
            println!("Initialized time-budget at: {}", paths.base_dir().display());
            println!();
            println!("Run 'timebudget budget create <name>' to add your first budget.");
        }
        Some(Commands::Config) => {
            println!("time-budget Configuration");
            println!("=========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Budgets file:    {}", paths.budgets_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            if let Some(settings) = state.settings() {
                print!("{}", format_settings(&settings));
            }
        }
        None => {
            println!("time-budget - budget your time as spendable funds");
            println!();
            println!("Run 'timebudget --help' for usage information.");
        }
    }

    Ok(())
}
