//! Reflects the effective dark mode on the page.

use crate::dom;
use sd_store::{PreferenceStore, SubscriptionId, selectors};

pub const DARK_CLASS: &str = "dark";

/// Apply the current mode and follow every change.
pub fn bind(store: &PreferenceStore) -> SubscriptionId {
    dom::set_root_class(DARK_CLASS, store.with(selectors::is_dark_mode));
    store.subscribe(|doc| dom::set_root_class(DARK_CLASS, selectors::is_dark_mode(doc)))
}
