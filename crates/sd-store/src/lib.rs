//! Swapdeck user preference store.
//!
//! A single serializable preference document, mutated only through named
//! updates, with derived selectors, persistence and OS theme tracking.

pub mod document;
pub mod migrate;
pub mod reducer;
pub mod selectors;
pub mod store;
pub mod theme_sync;

pub use document::{
    DEFAULT_DEADLINE_FROM_NOW, DONATION_END_TIMESTAMP, L2_DEADLINE_FROM_NOW, PreferenceDocument,
};
pub use reducer::UserAction;
pub use store::{Clock, PreferenceStore, SubscriptionId, SystemClock};
pub use theme_sync::{ColorSchemeSignal, Detach, StaticColorScheme, ThemeSync};
