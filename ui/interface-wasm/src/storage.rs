//! `localStorage` persistence and browser-side configuration.

use anyhow::{Result, anyhow};
use gloo_storage::{LocalStorage, Storage};
use sd_chain_rpc::DEFAULT_RPC_URL;
use sd_storage::PreferencePersistence;
use tracing::warn;

pub const PREFERENCES_KEY: &str = "swapdeck:user";
pub const RPC_URL_KEY: &str = "swapdeck:rpc-url";

/// Stores the serialized preference envelope under a single key.
pub struct LocalStoragePersistence {
    key: &'static str,
}

impl Default for LocalStoragePersistence {
    fn default() -> Self {
        Self {
            key: PREFERENCES_KEY,
        }
    }
}

fn local_storage() -> Result<web_sys::Storage> {
    gloo_utils::window()
        .local_storage()
        .map_err(|err| anyhow!("localStorage unavailable: {err:?}"))?
        .ok_or_else(|| anyhow!("localStorage unavailable"))
}

impl PreferencePersistence for LocalStoragePersistence {
    fn load(&self) -> Result<Option<String>> {
        local_storage()?
            .get_item(self.key)
            .map_err(|err| anyhow!("failed to read {}: {err:?}", self.key))
    }

    fn save(&self, raw: &str) -> Result<()> {
        local_storage()?
            .set_item(self.key, raw)
            .map_err(|err| anyhow!("failed to write {}: {err:?}", self.key))
    }

    fn clear(&self) -> Result<()> {
        LocalStorage::delete(self.key);
        Ok(())
    }
}

/// RPC endpoint for the read-only network connector.
pub fn rpc_url() -> String {
    match LocalStorage::get::<String>(RPC_URL_KEY) {
        Ok(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_owned(),
        Ok(_) => DEFAULT_RPC_URL.to_owned(),
        Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => DEFAULT_RPC_URL.to_owned(),
        Err(err) => {
            warn!("ignoring unreadable {RPC_URL_KEY}: {err}");
            DEFAULT_RPC_URL.to_owned()
        }
    }
}

pub fn set_rpc_url(url: &str) -> Result<()> {
    LocalStorage::set(RPC_URL_KEY, url).map_err(|err| anyhow!("failed to write {RPC_URL_KEY}: {err}"))
}
