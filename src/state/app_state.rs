//! Application state container
//!
//! One `AppState` is built at startup and passed by reference to whatever needs
//! it. Each field is a [`Property`] tagged with the screen region it refreshes.

use std::cell::RefCell;
use std::fmt;

use tracing::debug;

use crate::config::settings::{BalanceDisplayMode, RatioDisplayMode, Settings};
use crate::error::TimeBudgetResult;
use crate::models::{Budget, BudgetStack, FundId};
use crate::storage::Storage;

use super::dispatcher::{Dispatcher, RefreshKey, Subscription};
use super::property::Property;

/// Most recent fund paths remembered for the day view
pub const MAX_FUND_PATHS: usize = 3;

const NO_ACTION_DETAIL: &str = "No action selected";
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A chain of funds from a root budget down to a leaf fund
pub type FundPath = Vec<FundId>;

/// Settings needed to render the fund list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundListSettings {
    pub short_period_secs: i64,
    pub long_period_secs: i64,
    pub balance_display_mode: BalanceDisplayMode,
    pub ratio_display_mode: RatioDisplayMode,
}

impl From<&Settings> for FundListSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            short_period_secs: settings.short_period_secs,
            long_period_secs: settings.long_period_secs,
            balance_display_mode: settings.balance_display_mode,
            ratio_display_mode: settings.ratio_display_mode,
        }
    }
}

impl Default for FundListSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Settings needed to render the day view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayViewSettings {
    pub short_period_secs: i64,
}

impl From<&Settings> for DayViewSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            short_period_secs: settings.short_period_secs,
        }
    }
}

impl Default for DayViewSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainTab {
    #[default]
    Fund,
    Day,
}

/// What tapping a fund in the list does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FundAction {
    #[default]
    View,
    Spend,
    Earn,
    Reset,
    SubBudget,
    Edit,
}

impl FundAction {
    pub fn all() -> &'static [Self] {
        &[
            Self::View,
            Self::Spend,
            Self::Earn,
            Self::Reset,
            Self::SubBudget,
            Self::Edit,
        ]
    }

    /// Whether the action can be applied to every fund at once
    pub fn can_apply_to_all(&self) -> bool {
        matches!(self, Self::Spend | Self::Earn | Self::Reset)
    }
}

impl fmt::Display for FundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "View"),
            Self::Spend => write!(f, "Spend"),
            Self::Earn => write!(f, "Earn"),
            Self::Reset => write!(f, "Reset"),
            Self::SubBudget => write!(f, "Sub Budget"),
            Self::Edit => write!(f, "Edit"),
        }
    }
}

pub struct AppState {
    dispatcher: Dispatcher,
    settings: RefCell<Option<Settings>>,
    main_tab: Property<MainTab>,

    pub fund_list_settings: Property<FundListSettings>,
    pub day_view_settings: Property<DayViewSettings>,
    pub budget_stack: Property<BudgetStack>,
    pub day_view_reset_list_position: Property<bool>,
    pub day_view_scroll_offset: Property<usize>,
    pub day_view_plus_minus_days: Property<u32>,
    pub fund_list_action: Property<FundAction>,
    pub fund_list_action_detail: Property<String>,
    pub last_selected_fund_paths: Property<Vec<FundPath>>,
    pub title_override: Property<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        let dispatcher = Dispatcher::new();
        let d = &dispatcher;

        Self {
            settings: RefCell::new(None),
            main_tab: Property::new(MainTab::default(), RefreshKey::TopView, d),
            fund_list_settings: Property::new(FundListSettings::default(), RefreshKey::FundList, d),
            day_view_settings: Property::new(DayViewSettings::default(), RefreshKey::DayView, d),
            budget_stack: Property::new(BudgetStack::new(), RefreshKey::BudgetStack, d),
            day_view_reset_list_position: Property::new(true, RefreshKey::DayView, d),
            day_view_scroll_offset: Property::silent(0),
            day_view_plus_minus_days: Property::new(1, RefreshKey::DayView, d),
            fund_list_action: Property::new(FundAction::default(), RefreshKey::FundList, d),
            fund_list_action_detail: Property::new(NO_ACTION_DETAIL.to_string(), RefreshKey::FundList, d)
                .before_set(|before, after| {
                    debug!(from = %before, to = %after, "fund list action detail changed")
                }),
            last_selected_fund_paths: Property::new(Vec::new(), RefreshKey::DayView, d).before_set(
                |before: &Vec<FundPath>, after: &Vec<FundPath>| {
                    let leaf = |paths: &Vec<FundPath>| {
                        paths
                            .last()
                            .and_then(|path| path.last())
                            .map_or_else(|| "nil".to_string(), |id| id.to_string())
                    };
                    debug!(from = %leaf(before), to = %leaf(after), "last selected fund path changed")
                },
            ),
            title_override: Property::new(None, RefreshKey::TopView, d),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Register for notifications on `keys`
    pub fn subscribe<F>(&self, keys: &[RefreshKey], handler: F) -> Subscription
    where
        F: Fn(RefreshKey) + 'static,
    {
        self.dispatcher.subscribe(keys, handler)
    }

    /// Broadcast `key` after a committed change to the entity graph
    pub fn notify(&self, key: RefreshKey) {
        self.dispatcher.send(key);
    }

    /// Refresh the cached settings from the store
    ///
    /// Returns whether the settings record differed from the cached one. The
    /// two projections only broadcast if they changed themselves.
    pub fn load_settings(&self, storage: &Storage) -> TimeBudgetResult<bool> {
        let Some(settings) = storage.settings()? else {
            return Ok(false);
        };
        if self.settings.borrow().as_ref() == Some(&settings) {
            return Ok(false);
        }

        self.fund_list_settings.set(FundListSettings::from(&settings));
        self.day_view_settings.set(DayViewSettings::from(&settings));
        *self.settings.borrow_mut() = Some(settings);
        Ok(true)
    }

    pub fn settings(&self) -> Option<Settings> {
        self.settings.borrow().clone()
    }

    pub fn main_tab(&self) -> MainTab {
        self.main_tab.get()
    }

    /// Select a top-level view
    ///
    /// Re-selecting the active view acts as "go home": the day view jumps back
    /// to its default position; the fund view drops any title override,
    /// discards uncommitted edits and returns to the root budget.
    pub fn select_main_tab(&self, tab: MainTab, storage: &Storage) -> TimeBudgetResult<bool> {
        if self.main_tab.get() == tab {
            match tab {
                MainTab::Day => {
                    self.day_view_reset_list_position.set(true);
                }
                MainTab::Fund => {
                    self.title_override.set(None);
                    storage.rollback()?;
                    self.budget_stack.update(BudgetStack::to_first_budget);
                }
            }
        }
        Ok(self.main_tab.set(tab))
    }

    /// Title for the top bar
    pub fn title(&self, storage: &Storage) -> TimeBudgetResult<String> {
        if let Some(title) = self.title_override.get() {
            return Ok(title);
        }
        match self.budget_stack.with(|stack| stack.top().ok()) {
            Some(budget_id) => Ok(storage.require::<Budget>(budget_id)?.name),
            None => Ok("None".to_string()),
        }
    }

    /// Number of short periods in a day
    pub fn day_view_periods_per_day(&self) -> i64 {
        let short = self.day_view_settings.with(|s| s.short_period_secs).max(1);
        SECONDS_PER_DAY / short
    }

    /// Remember a fund path as the most recent one
    pub fn push_fund_path(&self, path: FundPath) {
        self.last_selected_fund_paths.update(|paths| {
            paths.retain(|existing| *existing != path);
            while paths.len() >= MAX_FUND_PATHS {
                paths.remove(0);
            }
            paths.push(path);
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
