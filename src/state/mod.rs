//! Reactive state for the presentation layer
//!
//! Properties broadcast a [`RefreshKey`] when their value changes so that only
//! the affected screen regions redraw. Everything here is single-threaded.

pub mod app_state;
pub mod dispatcher;
pub mod property;

pub use app_state::{
    AppState, DayViewSettings, FundAction, FundListSettings, FundPath, MainTab, MAX_FUND_PATHS,
};
pub use dispatcher::{Dispatcher, RefreshKey, Subscription};
pub use property::Property;
