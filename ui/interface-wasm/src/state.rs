//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).

use sd_connectors::Connection;
use sd_store::{Clock, PreferenceStore, SubscriptionId, ThemeSync};
use sd_types::{ChainId, WalletId};
use std::cell::RefCell;
use std::rc::Rc;

/// Wall clock backed by `Date.now()`.
pub struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Central application state.
#[derive(Default)]
pub struct AppState {
    pub store: Option<Rc<PreferenceStore>>,
    pub theme_sync: Option<ThemeSync>,
    /// Listener keeping the page's dark class in step with the store.
    pub theme_subscription: Option<SubscriptionId>,
    pub connected_wallets: Vec<WalletId>,
    /// Chain reported by a user wallet, else by the network connector.
    pub active_chain: Option<ChainId>,
    pub block_timestamp: Option<u64>,
}

// ── Thread-local singleton ──

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

/// Run a closure with shared read access to the state.
pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Run a closure with mutable access to the state.
pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

// ── Convenience accessors ──

pub fn is_mounted() -> bool {
    with(|s| s.store.is_some())
}

pub fn mount(
    store: Rc<PreferenceStore>,
    theme_sync: ThemeSync,
    theme_subscription: SubscriptionId,
) {
    with_mut(|s| {
        s.store = Some(store);
        s.theme_sync = Some(theme_sync);
        s.theme_subscription = Some(theme_subscription);
    });
}

/// Tear down everything `mount` installed and forget the session.
pub fn unmount() {
    // Release outside the borrow: the signal may call back into the store.
    let (store, theme_sync, theme_subscription) = with_mut(|s| {
        s.connected_wallets.clear();
        s.active_chain = None;
        s.block_timestamp = None;
        (s.store.take(), s.theme_sync.take(), s.theme_subscription.take())
    });
    if let Some(sync) = theme_sync {
        sync.detach();
    }
    if let (Some(store), Some(id)) = (store, theme_subscription) {
        store.unsubscribe(id);
    }
}

pub fn store() -> Option<Rc<PreferenceStore>> {
    with(|s| s.store.clone())
}

pub fn record_connection(wallet: WalletId, connection: &Connection) {
    with_mut(|s| {
        if !s.connected_wallets.contains(&wallet) {
            s.connected_wallets.push(wallet);
        }
        if let Some(chain) = connection.chain_id {
            if wallet != WalletId::Network || s.active_chain.is_none() {
                s.active_chain = Some(chain);
            }
        }
    });
}

pub fn active_chain() -> Option<ChainId> {
    with(|s| s.active_chain)
}

pub fn connected_wallets() -> Vec<WalletId> {
    with(|s| s.connected_wallets.clone())
}

pub fn block_timestamp() -> Option<u64> {
    with(|s| s.block_timestamp)
}

pub fn set_block_timestamp(timestamp: Option<u64>) {
    with_mut(|s| s.block_timestamp = timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_storage::InMemoryPersistence;
    use sd_store::StaticColorScheme;
    use std::cell::Cell;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            1_700_000_000_000
        }
    }

    fn connection(chain: u64) -> Connection {
        Connection {
            chain_id: Some(ChainId(chain)),
            accounts: Vec::new(),
        }
    }

    #[test]
    fn unmount_releases_the_theme_listener_and_the_store() {
        let prefs = Rc::new(PreferenceStore::load(FixedClock, InMemoryPersistence::default()));
        let sync = ThemeSync::attach(&prefs, &StaticColorScheme(true));
        let notified = Rc::new(Cell::new(0));
        let subscription = prefs.subscribe({
            let notified = Rc::clone(&notified);
            move |_| notified.set(notified.get() + 1)
        });
        mount(Rc::clone(&prefs), sync, subscription);
        record_connection(WalletId::Injected, &connection(10));
        assert!(is_mounted());

        unmount();
        assert!(!is_mounted());
        assert!(store().is_none());
        assert_eq!(active_chain(), None);
        assert!(connected_wallets().is_empty());

        prefs.toggle_expert_mode();
        assert_eq!(notified.get(), 0);
        assert!(!prefs.unsubscribe(subscription));
        assert_eq!(Rc::strong_count(&prefs), 1);
    }

    #[test]
    fn user_wallet_chain_wins_over_network() {
        record_connection(WalletId::Network, &connection(1));
        assert_eq!(active_chain(), Some(ChainId::MAINNET));

        record_connection(WalletId::Injected, &connection(10));
        record_connection(WalletId::Network, &connection(1));
        assert_eq!(active_chain(), Some(ChainId::OPTIMISM));
        assert_eq!(connected_wallets(), vec![WalletId::Network, WalletId::Injected]);
    }
}
