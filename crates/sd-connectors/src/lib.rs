use anyhow::{Result, bail};
use async_trait::async_trait;
use sd_types::{ChainId, WalletId};
use std::collections::HashMap;
use std::rc::Rc;

pub mod bootstrap;

pub use bootstrap::{
    ALWAYS_ON_WALLETS, ActivationAttempt, ActivationMode, AttemptOutcome, AttemptSource, Bootstrap,
    BootstrapInput, BootstrapReport, HostCapabilities, plan_bootstrap,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub chain_id: Option<ChainId>,
    pub accounts: Vec<String>,
}

/// A wallet connection mechanism (injected provider, Safe iframe, read-only
/// RPC, remote signer). Futures are not `Send` so browser promises fit.
#[async_trait(?Send)]
pub trait Connector {
    fn wallet(&self) -> WalletId;

    /// Whether [`Connector::connect_eagerly`] can resume without prompting.
    fn supports_eager(&self) -> bool {
        false
    }

    async fn connect_eagerly(&self) -> Result<Connection> {
        bail!("{} does not support eager connection", self.wallet())
    }

    /// Full activation; may prompt the user.
    async fn activate(&self) -> Result<Connection>;
}

#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<WalletId, Rc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn register(&mut self, connector: Rc<dyn Connector>) {
        self.connectors.insert(connector.wallet(), connector);
    }

    pub fn connector(&self, wallet: WalletId) -> Option<Rc<dyn Connector>> {
        self.connectors.get(&wallet).cloned()
    }

    pub fn wallets(&self) -> Vec<WalletId> {
        let mut wallets: Vec<WalletId> = self.connectors.keys().copied().collect();
        wallets.sort();
        wallets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(WalletId);

    #[async_trait(?Send)]
    impl Connector for Dummy {
        fn wallet(&self) -> WalletId {
            self.0
        }

        async fn activate(&self) -> Result<Connection> {
            Ok(Connection::default())
        }
    }

    #[test]
    fn registry_keys_by_wallet() {
        let mut registry = ConnectorRegistry::default();
        registry.register(Rc::new(Dummy(WalletId::Network)));
        registry.register(Rc::new(Dummy(WalletId::Injected)));
        registry.register(Rc::new(Dummy(WalletId::Injected)));

        assert_eq!(registry.wallets(), vec![WalletId::Injected, WalletId::Network]);
        assert!(registry.connector(WalletId::Fortmatic).is_none());
    }

    #[tokio::test]
    async fn eager_is_unsupported_by_default() {
        let connector = Dummy(WalletId::Fortmatic);
        assert!(!connector.supports_eager());
        let err = connector.connect_eagerly().await.unwrap_err();
        assert!(err.to_string().contains("FORTMATIC"));
    }
}
