use anyhow::Context;
use sd_chain_rpc::{JsonRpcClient, NetworkConnector, current_block_timestamp};
use sd_connectors::{
    Bootstrap, BootstrapInput, BootstrapReport, ConnectorRegistry, HostCapabilities,
};
use sd_storage::{PreferencePersistence, RocksDbPersistence};
use sd_store::{PreferenceStore, StaticColorScheme, SystemClock, ThemeSync, selectors};
use sd_types::{ChainId, Locale, SlippageTolerance, WalletId};
use serde::Serialize;
use std::rc::Rc;
use tracing::info;

mod config;

use config::HostConfig;

#[derive(Debug, Serialize)]
struct HostSummary {
    service: &'static str,
    version: &'static str,
    selected_wallet: Option<WalletId>,
    connected_wallets: Vec<WalletId>,
    active_chain: Option<ChainId>,
    dark_mode: bool,
    locale: Option<Locale>,
    expert_mode: bool,
    slippage_tolerance: SlippageTolerance,
    deadline_seconds: u64,
    transaction_deadline: Option<u64>,
    donation_link_visible: bool,
    url_warning_visible: bool,
    added_tokens: usize,
    tracked_pairs: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = HostConfig::from_env()?;
    std::fs::create_dir_all(&config.state_path)
        .with_context(|| format!("failed to create state directory: {}", config.state_path))?;
    let persistence = RocksDbPersistence::open_default(&config.state_path)
        .with_context(|| format!("failed to open preference database: {}", config.state_path))?;
    info!("state-host using preferences at {}", config.state_path);

    let summary = run_host(&config, persistence).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn bootstrap_input(store: &PreferenceStore) -> BootstrapInput {
    store.with(|doc| BootstrapInput {
        selected_wallet: doc.selected_wallet,
        selected_wallet_backfilled: doc.selected_wallet_backfilled,
    })
}

/// Run the bootstrap from the persisted selection and record a backfilled
/// wallet, so the next mount resumes it as the selected one.
async fn bootstrap_wallets(store: &PreferenceStore, bootstrap: &Bootstrap) -> BootstrapReport {
    let report = bootstrap
        .run(&bootstrap_input(store))
        .await
        .unwrap_or_default();
    if let Some(wallet) = report.backfilled_wallet() {
        info!(%wallet, "recording backfilled wallet selection");
        store.set_selected_wallet(Some(wallet));
    }
    report
}

/// Mount the store, sync the colour scheme, bootstrap wallets once and
/// derive the view a client would render.
async fn run_host(
    config: &HostConfig,
    persistence: impl PreferencePersistence + 'static,
) -> HostSummary {
    let store = Rc::new(PreferenceStore::load(SystemClock, persistence));
    let _theme = ThemeSync::attach(&store, &StaticColorScheme(config.prefers_dark));

    let mut registry = ConnectorRegistry::default();
    registry.register(Rc::new(NetworkConnector::new(JsonRpcClient::new(Some(
        config.rpc_url.clone(),
    )))));
    let host = HostCapabilities {
        is_mobile: config.is_mobile,
        has_metamask: false,
    };
    let report = bootstrap_wallets(&store, &Bootstrap::new(registry, host)).await;

    let active_chain = report.active_chain();
    let block_timestamp =
        current_block_timestamp(&JsonRpcClient::new(Some(config.rpc_url.clone()))).await;

    store.with(|doc| HostSummary {
        service: "state-host",
        version: env!("CARGO_PKG_VERSION"),
        selected_wallet: doc.selected_wallet,
        connected_wallets: report.connected_wallets(),
        active_chain,
        dark_mode: selectors::is_dark_mode(doc),
        locale: doc.user_locale.clone(),
        expert_mode: doc.user_expert_mode,
        slippage_tolerance: doc.user_slippage_tolerance,
        deadline_seconds: selectors::effective_deadline(doc, active_chain),
        transaction_deadline: selectors::transaction_deadline(doc, active_chain, block_timestamp),
        donation_link_visible: selectors::is_donation_link_visible(doc, block_timestamp),
        url_warning_visible: selectors::url_warning_visible(doc),
        added_tokens: selectors::user_added_tokens(doc, active_chain).len(),
        tracked_pairs: active_chain
            .map(|chain| selectors::tracked_pairs(doc, chain).len())
            .unwrap_or(0),
    })
}
