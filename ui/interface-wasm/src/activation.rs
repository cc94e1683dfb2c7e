//! Mount-time wallet activation.
//!
//! Every planned attempt runs as its own task on the event loop, so a
//! connector that never settles does not hold up the others.

use crate::{connectors, state};
use sd_chain_rpc::{JsonRpcClient, current_block_timestamp};
use sd_connectors::{AttemptOutcome, Bootstrap, BootstrapInput, HostCapabilities};
use sd_store::PreferenceStore;
use std::rc::Rc;
use tracing::info;
use wasm_bindgen_futures::spawn_local;

pub fn start(store: &Rc<PreferenceStore>, host: HostCapabilities, rpc_url: &str) {
    let bootstrap = Rc::new(Bootstrap::new(connectors::registry(rpc_url), host));
    let input = store.with(|doc| BootstrapInput {
        selected_wallet: doc.selected_wallet,
        selected_wallet_backfilled: doc.selected_wallet_backfilled,
    });

    let Some(plan) = bootstrap.begin(&input) else {
        return;
    };

    for attempt in plan {
        let bootstrap = Rc::clone(&bootstrap);
        let store = Rc::clone(store);
        spawn_local(async move {
            let outcome = bootstrap.attempt(attempt).await;
            if let AttemptOutcome::Connected(connection) = &outcome {
                state::record_connection(attempt.wallet, connection);
            }
            // First backfill to connect wins.
            if let Some(wallet) = attempt.selection_to_record(&outcome) {
                if store.with(|doc| doc.selected_wallet.is_none()) {
                    info!(%wallet, "recording backfilled wallet selection");
                    store.set_selected_wallet(Some(wallet));
                }
            }
        });
    }
}

/// Fetch the latest block time for deadline and donation-link views.
pub fn refresh_block_time(rpc_url: &str) {
    let client = JsonRpcClient::new(Some(rpc_url.to_owned()));
    spawn_local(async move {
        let timestamp = current_block_timestamp(&client).await;
        state::set_block_timestamp(timestamp);
    });
}
