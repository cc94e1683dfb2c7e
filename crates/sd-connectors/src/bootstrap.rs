//! Mount-time wallet bootstrap.
//!
//! Priority, evaluated once:
//! 1. the always-on connectors (Safe iframe, read-only network), eagerly;
//! 2. mobile browser with MetaMask injected: full activation of `INJECTED`;
//! 3. otherwise the previously selected wallet, eagerly;
//! 4. otherwise, if no selection was ever recorded, every backfillable
//!    wallet in order, eagerly, without stopping at the first success.
//!
//! Attempts run concurrently. Failures are logged and swallowed; nothing
//! is retried.

use crate::{Connection, Connector, ConnectorRegistry};
use futures::future::join_all;
use sd_types::{BACKFILLABLE_WALLETS, ChainId, WalletId};
use std::cell::Cell;
use tracing::{debug, info};

pub const ALWAYS_ON_WALLETS: [WalletId; 2] = [WalletId::GnosisSafe, WalletId::Network];

/// Host facts probed once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub is_mobile: bool,
    pub has_metamask: bool,
}

/// The persisted wallet selection the sequence starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapInput {
    pub selected_wallet: Option<WalletId>,
    pub selected_wallet_backfilled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// Resume silently when the connector supports it, else full activation.
    Eager,
    /// Full activation; may prompt.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptSource {
    AlwaysOn,
    MobileInjected,
    Selected,
    Backfill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationAttempt {
    pub wallet: WalletId,
    pub mode: ActivationMode,
    pub source: AttemptSource,
}

impl ActivationAttempt {
    fn new(wallet: WalletId, mode: ActivationMode, source: AttemptSource) -> Self {
        Self {
            wallet,
            mode,
            source,
        }
    }

    /// The wallet a host should record as selected after this attempt, if any.
    pub fn selection_to_record(&self, outcome: &AttemptOutcome) -> Option<WalletId> {
        match (self.source, outcome) {
            (AttemptSource::Backfill, AttemptOutcome::Connected(_)) => Some(self.wallet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Connected(Connection),
    Failed(String),
    /// No connector registered for the wallet.
    Unavailable,
}

pub fn plan_bootstrap(
    input: &BootstrapInput,
    host: HostCapabilities,
    backfillable: &[WalletId],
) -> Vec<ActivationAttempt> {
    let mut plan: Vec<ActivationAttempt> = ALWAYS_ON_WALLETS
        .iter()
        .map(|&wallet| ActivationAttempt::new(wallet, ActivationMode::Eager, AttemptSource::AlwaysOn))
        .collect();

    if host.is_mobile && host.has_metamask {
        plan.push(ActivationAttempt::new(
            WalletId::Injected,
            ActivationMode::Interactive,
            AttemptSource::MobileInjected,
        ));
    } else if let Some(wallet) = input.selected_wallet {
        plan.push(ActivationAttempt::new(
            wallet,
            ActivationMode::Eager,
            AttemptSource::Selected,
        ));
    } else if !input.selected_wallet_backfilled {
        plan.extend(backfillable.iter().map(|&wallet| {
            ActivationAttempt::new(wallet, ActivationMode::Eager, AttemptSource::Backfill)
        }));
    }

    plan
}

async fn activate(connector: &dyn Connector, mode: ActivationMode) -> anyhow::Result<Connection> {
    match mode {
        ActivationMode::Eager if connector.supports_eager() => connector.connect_eagerly().await,
        _ => connector.activate().await,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub outcomes: Vec<(ActivationAttempt, AttemptOutcome)>,
}

impl BootstrapReport {
    /// First backfilled wallet that connected.
    pub fn backfilled_wallet(&self) -> Option<WalletId> {
        self.outcomes
            .iter()
            .find_map(|(attempt, outcome)| attempt.selection_to_record(outcome))
    }

    pub fn connected_wallets(&self) -> Vec<WalletId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, AttemptOutcome::Connected(_)))
            .map(|(attempt, _)| attempt.wallet)
            .collect()
    }

    /// Chain reported by a user wallet, else by the read-only network.
    pub fn active_chain(&self) -> Option<ChainId> {
        let chain_of = |want_network: bool| {
            self.outcomes.iter().find_map(|(attempt, outcome)| match outcome {
                AttemptOutcome::Connected(connection)
                    if (attempt.wallet == WalletId::Network) == want_network =>
                {
                    connection.chain_id
                }
                _ => None,
            })
        };
        chain_of(false).or_else(|| chain_of(true))
    }
}

/// Runs the sequence at most once.
pub struct Bootstrap {
    registry: ConnectorRegistry,
    host: HostCapabilities,
    backfillable: Vec<WalletId>,
    started: Cell<bool>,
}

impl Bootstrap {
    pub fn new(registry: ConnectorRegistry, host: HostCapabilities) -> Self {
        Self {
            registry,
            host,
            backfillable: BACKFILLABLE_WALLETS.to_vec(),
            started: Cell::new(false),
        }
    }

    pub fn with_backfillable(mut self, wallets: &[WalletId]) -> Self {
        self.backfillable = wallets.to_vec();
        self
    }

    pub fn has_run(&self) -> bool {
        self.started.get()
    }

    /// Plan the attempts and mark the sequence as run. `None` on a second call.
    pub fn begin(&self, input: &BootstrapInput) -> Option<Vec<ActivationAttempt>> {
        if self.started.replace(true) {
            debug!("wallet bootstrap already ran for this mount");
            return None;
        }
        let plan = plan_bootstrap(input, self.host, &self.backfillable);
        info!(attempts = plan.len(), "starting wallet bootstrap");
        Some(plan)
    }

    /// One attempt inside its own fault boundary.
    pub async fn attempt(&self, attempt: ActivationAttempt) -> AttemptOutcome {
        let Some(connector) = self.registry.connector(attempt.wallet) else {
            debug!(wallet = %attempt.wallet, "no connector registered, skipping");
            return AttemptOutcome::Unavailable;
        };

        match activate(connector.as_ref(), attempt.mode).await {
            Ok(connection) => {
                debug!(wallet = %attempt.wallet, chain = ?connection.chain_id, "wallet connected");
                AttemptOutcome::Connected(connection)
            }
            Err(err) => {
                debug!(wallet = %attempt.wallet, "eager connection error: {err:#}");
                AttemptOutcome::Failed(format!("{err:#}"))
            }
        }
    }

    /// Drive every planned attempt concurrently. A pending attempt never
    /// holds back the others; outcomes keep plan order.
    pub async fn run(&self, input: &BootstrapInput) -> Option<BootstrapReport> {
        let plan = self.begin(input)?;
        let outcomes = join_all(
            plan.into_iter()
                .map(|attempt| async move { (attempt, self.attempt(attempt).await) }),
        )
        .await;
        Some(BootstrapReport { outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<(WalletId, &'static str)>>>;

    struct Recording {
        wallet: WalletId,
        eager: bool,
        fail: bool,
        chain: Option<ChainId>,
        calls: CallLog,
    }

    impl Recording {
        fn connection(&self) -> Result<Connection> {
            if self.fail {
                bail!("user rejected the request");
            }
            Ok(Connection {
                chain_id: self.chain,
                accounts: vec!["0xabc".to_owned()],
            })
        }
    }

    #[async_trait(?Send)]
    impl Connector for Recording {
        fn wallet(&self) -> WalletId {
            self.wallet
        }

        fn supports_eager(&self) -> bool {
            self.eager
        }

        async fn connect_eagerly(&self) -> Result<Connection> {
            self.calls.borrow_mut().push((self.wallet, "eager"));
            self.connection()
        }

        async fn activate(&self) -> Result<Connection> {
            self.calls.borrow_mut().push((self.wallet, "activate"));
            self.connection()
        }
    }

    fn registry(calls: &CallLog, failing: &[WalletId]) -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::default();
        for wallet in WalletId::ALL {
            registry.register(Rc::new(Recording {
                wallet,
                eager: wallet != WalletId::Fortmatic,
                fail: failing.contains(&wallet),
                chain: match wallet {
                    WalletId::Network => Some(ChainId::MAINNET),
                    _ => Some(ChainId::OPTIMISM),
                },
                calls: Rc::clone(calls),
            }));
        }
        registry
    }

    fn wallets_called(calls: &CallLog) -> Vec<WalletId> {
        calls.borrow().iter().map(|(wallet, _)| *wallet).collect()
    }

    #[test]
    fn plan_without_selection_backfills_everything() {
        let plan = plan_bootstrap(
            &BootstrapInput::default(),
            HostCapabilities::default(),
            &BACKFILLABLE_WALLETS,
        );
        let wallets: Vec<WalletId> = plan.iter().map(|a| a.wallet).collect();
        assert_eq!(
            wallets,
            vec![
                WalletId::GnosisSafe,
                WalletId::Network,
                WalletId::CoinbaseWallet,
                WalletId::WalletConnect,
                WalletId::Injected,
            ]
        );
        assert!(plan.iter().all(|a| a.mode == ActivationMode::Eager));
    }

    #[test]
    fn plan_mobile_metamask_wins_over_selection() {
        let input = BootstrapInput {
            selected_wallet: Some(WalletId::WalletConnect),
            selected_wallet_backfilled: true,
        };
        let host = HostCapabilities {
            is_mobile: true,
            has_metamask: true,
        };
        let plan = plan_bootstrap(&input, host, &BACKFILLABLE_WALLETS);
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan[2],
            ActivationAttempt::new(
                WalletId::Injected,
                ActivationMode::Interactive,
                AttemptSource::MobileInjected
            )
        );
    }

    #[test]
    fn plan_backfilled_without_selection_only_runs_always_on() {
        let input = BootstrapInput {
            selected_wallet: None,
            selected_wallet_backfilled: true,
        };
        let plan = plan_bootstrap(&input, HostCapabilities::default(), &BACKFILLABLE_WALLETS);
        assert!(plan.iter().all(|a| a.source == AttemptSource::AlwaysOn));
    }

    #[tokio::test]
    async fn every_backfill_wallet_is_attempted_in_order_despite_failures() {
        let calls: CallLog = Rc::default();
        let bootstrap = Bootstrap::new(
            registry(&calls, &[WalletId::Injected, WalletId::Fortmatic]),
            HostCapabilities::default(),
        )
        .with_backfillable(&[WalletId::Injected, WalletId::Fortmatic, WalletId::WalletConnect]);

        let report = bootstrap
            .run(&BootstrapInput::default())
            .await
            .expect("first run");

        assert_eq!(
            wallets_called(&calls),
            vec![
                WalletId::GnosisSafe,
                WalletId::Network,
                WalletId::Injected,
                WalletId::Fortmatic,
                WalletId::WalletConnect,
            ]
        );
        // no eager support falls back to full activation
        assert_eq!(calls.borrow()[3], (WalletId::Fortmatic, "activate"));
        assert!(matches!(report.outcomes[2].1, AttemptOutcome::Failed(_)));
        assert_eq!(report.backfilled_wallet(), Some(WalletId::WalletConnect));
    }

    #[tokio::test]
    async fn previously_selected_wallet_is_the_only_user_attempt() {
        let calls: CallLog = Rc::default();
        let bootstrap = Bootstrap::new(registry(&calls, &[]), HostCapabilities::default());
        let input = BootstrapInput {
            selected_wallet: Some(WalletId::CoinbaseWallet),
            selected_wallet_backfilled: true,
        };

        let report = bootstrap.run(&input).await.expect("first run");
        assert_eq!(
            wallets_called(&calls),
            vec![WalletId::GnosisSafe, WalletId::Network, WalletId::CoinbaseWallet]
        );
        assert_eq!(report.backfilled_wallet(), None);
        assert_eq!(report.active_chain(), Some(ChainId::OPTIMISM));
    }

    #[tokio::test]
    async fn mobile_injected_is_activated_interactively() {
        let calls: CallLog = Rc::default();
        let host = HostCapabilities {
            is_mobile: true,
            has_metamask: true,
        };
        let bootstrap = Bootstrap::new(registry(&calls, &[]), host);
        bootstrap.run(&BootstrapInput::default()).await;

        assert_eq!(
            calls.borrow().last().copied(),
            Some((WalletId::Injected, "activate"))
        );
    }

    /// Never settles, like a Safe iframe that ignores the handshake.
    struct Hanging {
        wallet: WalletId,
        calls: CallLog,
    }

    #[async_trait(?Send)]
    impl Connector for Hanging {
        fn wallet(&self) -> WalletId {
            self.wallet
        }

        fn supports_eager(&self) -> bool {
            true
        }

        async fn connect_eagerly(&self) -> Result<Connection> {
            self.calls.borrow_mut().push((self.wallet, "eager"));
            std::future::pending().await
        }

        async fn activate(&self) -> Result<Connection> {
            self.calls.borrow_mut().push((self.wallet, "activate"));
            std::future::pending().await
        }
    }

    #[test]
    fn hung_always_on_attempt_does_not_block_backfill() {
        let calls: CallLog = Rc::default();
        let mut registry = registry(&calls, &[]);
        registry.register(Rc::new(Hanging {
            wallet: WalletId::GnosisSafe,
            calls: Rc::clone(&calls),
        }));
        let bootstrap = Bootstrap::new(registry, HostCapabilities::default());

        // a single poll starts every attempt; the Safe one stays pending
        let settled = bootstrap.run(&BootstrapInput::default()).now_or_never();
        assert!(settled.is_none());
        assert!(bootstrap.has_run());
        assert_eq!(
            wallets_called(&calls),
            vec![
                WalletId::GnosisSafe,
                WalletId::Network,
                WalletId::CoinbaseWallet,
                WalletId::WalletConnect,
                WalletId::Injected,
            ]
        );
    }

    #[tokio::test]
    async fn runs_only_once() {
        let calls: CallLog = Rc::default();
        let bootstrap = Bootstrap::new(registry(&calls, &[]), HostCapabilities::default());
        assert!(!bootstrap.has_run());
        assert!(bootstrap.run(&BootstrapInput::default()).await.is_some());
        let first = calls.borrow().len();

        assert!(bootstrap.has_run());
        assert!(bootstrap.run(&BootstrapInput::default()).await.is_none());
        assert_eq!(calls.borrow().len(), first);
    }

    #[tokio::test]
    async fn missing_connectors_are_skipped() {
        let calls: CallLog = Rc::default();
        let mut registry = ConnectorRegistry::default();
        registry.register(Rc::new(Recording {
            wallet: WalletId::Network,
            eager: true,
            fail: false,
            chain: Some(ChainId::MAINNET),
            calls: Rc::clone(&calls),
        }));
        let bootstrap = Bootstrap::new(registry, HostCapabilities::default());

        let report = bootstrap
            .run(&BootstrapInput::default())
            .await
            .expect("first run");
        assert_eq!(report.outcomes[0].1, AttemptOutcome::Unavailable);
        assert_eq!(report.connected_wallets(), vec![WalletId::Network]);
        assert_eq!(report.active_chain(), Some(ChainId::MAINNET));
        assert_eq!(report.backfilled_wallet(), None);
    }
}
