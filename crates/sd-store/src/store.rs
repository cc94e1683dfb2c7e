//! The preference store container.
//!
//! Single-threaded: interior mutability through `RefCell`, shared with `Rc`.
//! Every dispatch runs the reducer, hands the new document to the
//! persistence middleware and then notifies subscribers synchronously.

use crate::document::PreferenceDocument;
use crate::migrate;
use crate::reducer::{self, UserAction};
use crate::selectors;
use sd_storage::{NoopPersistence, PreferencePersistence};
use sd_types::{
    Address, AllowedSlippage, ChainId, Locale, PairRecord, SlippageTolerance, TokenRecord, WalletId,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock. Not usable on `wasm32-unknown-unknown`; browser hosts supply
/// their own [`Clock`].
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&PreferenceDocument)>;

pub struct PreferenceStore {
    document: RefCell<PreferenceDocument>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
    clock: Box<dyn Clock>,
    persistence: Box<dyn PreferencePersistence>,
}

impl PreferenceStore {
    /// Fresh defaults, nothing persisted.
    pub fn new(clock: impl Clock + 'static) -> Self {
        let document = PreferenceDocument::initial(clock.now_ms());
        Self::from_parts(document, Box::new(clock), Box::new(NoopPersistence))
    }

    /// Rehydrate from `persistence`, migrating older schemas. Loading never
    /// fails: unreadable state is logged and replaced with defaults.
    pub fn load(
        clock: impl Clock + 'static,
        persistence: impl PreferencePersistence + 'static,
    ) -> Self {
        let now = clock.now_ms();
        let (document, write_back) = match persistence.load() {
            Ok(Some(raw)) => match migrate::decode(&raw) {
                Ok(loaded) => {
                    if loaded.was_migrated() {
                        info!(
                            from = loaded.from_version,
                            to = migrate::SCHEMA_VERSION,
                            "migrated persisted preferences"
                        );
                    }
                    let migrated = loaded.was_migrated();
                    (loaded.document, migrated)
                }
                Err(err) => {
                    warn!("discarding unreadable persisted preferences: {err:#}");
                    (PreferenceDocument::initial(now), true)
                }
            },
            Ok(None) => (PreferenceDocument::initial(now), false),
            Err(err) => {
                warn!("failed to load persisted preferences: {err:#}");
                (PreferenceDocument::initial(now), false)
            }
        };

        let store = Self::from_parts(document, Box::new(clock), Box::new(persistence));
        if write_back {
            let snapshot = store.snapshot();
            store.persist(&snapshot);
        }
        store
    }

    fn from_parts(
        document: PreferenceDocument,
        clock: Box<dyn Clock>,
        persistence: Box<dyn PreferencePersistence>,
    ) -> Self {
        Self {
            document: RefCell::new(document),
            listeners: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            clock,
            persistence,
        }
    }

    /// Run a closure with shared read access to the document.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&PreferenceDocument) -> R,
    {
        f(&self.document.borrow())
    }

    pub fn snapshot(&self) -> PreferenceDocument {
        self.document.borrow().clone()
    }

    pub fn dispatch(&self, action: UserAction) {
        let kind = action.kind();
        let now = self.clock.now_ms();
        let snapshot = {
            let mut doc = self.document.borrow_mut();
            reducer::reduce(&mut doc, action, now);
            doc.clone()
        };
        debug!(action = kind, timestamp = snapshot.timestamp, "preferences updated");

        self.persist(&snapshot);
        self.notify(&snapshot);
    }

    /// Listeners run after every dispatch, in subscription order. They may
    /// dispatch or subscribe themselves.
    pub fn subscribe(&self, listener: impl Fn(&PreferenceDocument) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, snapshot: &PreferenceDocument) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn persist(&self, snapshot: &PreferenceDocument) {
        let result = migrate::encode(snapshot).and_then(|raw| self.persistence.save(&raw));
        if let Err(err) = result {
            warn!("failed to persist preferences: {err:#}");
        }
    }

    // ── Named operations ──

    pub fn set_selected_wallet(&self, wallet: Option<WalletId>) {
        self.dispatch(UserAction::UpdateSelectedWallet(wallet));
    }

    pub fn set_user_dark_mode(&self, value: Option<bool>) {
        self.dispatch(UserAction::UpdateUserDarkMode(value));
    }

    pub fn set_matches_dark_mode(&self, value: bool) {
        self.dispatch(UserAction::UpdateMatchesDarkMode(value));
    }

    pub fn toggle_dark_mode(&self) {
        let dark = self.with(selectors::is_dark_mode);
        self.set_user_dark_mode(Some(!dark));
    }

    pub fn set_expert_mode(&self, value: bool) {
        self.dispatch(UserAction::UpdateUserExpertMode(value));
    }

    pub fn toggle_expert_mode(&self) {
        let expert = self.with(|doc| doc.user_expert_mode);
        self.set_expert_mode(!expert);
    }

    pub fn set_locale(&self, locale: Locale) {
        self.dispatch(UserAction::UpdateUserLocale(locale));
    }

    pub fn set_slippage_tolerance(&self, value: SlippageTolerance) {
        self.dispatch(UserAction::UpdateUserSlippageTolerance(value));
    }

    /// Store a settings-UI value; fractions that do not fit in bips become `"auto"`.
    pub fn set_slippage_tolerance_percent(&self, value: AllowedSlippage) {
        self.set_slippage_tolerance(selectors::slippage_for_storage(value));
    }

    pub fn set_deadline(&self, seconds: u64) {
        self.dispatch(UserAction::UpdateUserDeadline(seconds));
    }

    pub fn set_client_side_router(&self, value: bool) {
        self.dispatch(UserAction::UpdateUserClientSideRouter(value));
    }

    pub fn set_hide_closed_positions(&self, value: bool) {
        self.dispatch(UserAction::UpdateHideClosedPositions(value));
    }

    pub fn set_show_survey_popup(&self, value: Option<bool>) {
        self.dispatch(UserAction::UpdateShowSurveyPopup(value));
    }

    pub fn set_show_donation_link(&self, value: bool) {
        self.dispatch(UserAction::UpdateShowDonationLink(value));
    }

    pub fn toggle_url_warning(&self) {
        self.dispatch(UserAction::ToggleUrlWarning);
    }

    pub fn add_token(&self, token: TokenRecord) {
        self.dispatch(UserAction::AddToken(token));
    }

    pub fn remove_token(&self, chain_id: ChainId, address: Address) {
        self.dispatch(UserAction::RemoveToken { chain_id, address });
    }

    pub fn add_pair(&self, pair: PairRecord) {
        self.dispatch(UserAction::AddPair(pair));
    }

    pub fn remove_pair(&self, chain_id: ChainId, token_a: Address, token_b: Address) {
        self.dispatch(UserAction::RemovePair {
            chain_id,
            token_a,
            token_b,
        });
    }
}
