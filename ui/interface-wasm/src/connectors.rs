//! Browser wallet connectors.
//!
//! Injected EIP-1193 providers (any injected, Coinbase Wallet by flag), the
//! Safe apps iframe handshake and WalletConnect session restore.

use crate::{dom, platform};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use gloo_storage::{LocalStorage, Storage};
use gloo_timers::callback::Timeout;
use sd_chain_rpc::{JsonRpcClient, NetworkConnector, parse_quantity};
use sd_connectors::{Connection, Connector, ConnectorRegistry};
use sd_types::{ChainId, WalletId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

fn js_error(value: JsValue) -> anyhow::Error {
    match value.as_string() {
        Some(message) => anyhow!(message),
        None => match dom::property(&value, "message").and_then(|m| m.as_string()) {
            Some(message) => anyhow!(message),
            None => anyhow!("{value:?}"),
        },
    }
}

// ── EIP-1193 ──

async fn provider_request(provider: &JsValue, method: &str) -> Result<JsValue> {
    let request: js_sys::Function = dom::property(provider, "request")
        .and_then(|f| f.dyn_into().ok())
        .ok_or_else(|| anyhow!("provider has no request()"))?;

    let args = js_sys::Object::new();
    js_sys::Reflect::set(&args, &"method".into(), &method.into()).map_err(js_error)?;

    let promise: js_sys::Promise = request
        .call1(provider, &args)
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| anyhow!("{method} did not return a promise"))?;
    JsFuture::from(promise)
        .await
        .map_err(js_error)
        .with_context(|| format!("{method} rejected"))
}

async fn provider_connection(provider: &JsValue, accounts_method: &str) -> Result<Connection> {
    let accounts: Vec<String> =
        serde_wasm_bindgen::from_value(provider_request(provider, accounts_method).await?)
            .map_err(|err| anyhow!("{accounts_method} returned malformed accounts: {err}"))?;
    if accounts.is_empty() {
        bail!("no authorized accounts");
    }

    let chain = provider_request(provider, "eth_chainId")
        .await?
        .as_string()
        .ok_or_else(|| anyhow!("eth_chainId returned a non-string"))?;

    Ok(Connection {
        chain_id: Some(ChainId(parse_quantity(&chain)?)),
        accounts,
    })
}

/// An injected provider, optionally narrowed by a provider flag.
pub struct InjectedConnector {
    wallet: WalletId,
    flag: Option<&'static str>,
}

impl InjectedConnector {
    pub fn any() -> Self {
        Self {
            wallet: WalletId::Injected,
            flag: None,
        }
    }

    pub fn coinbase() -> Self {
        Self {
            wallet: WalletId::CoinbaseWallet,
            flag: Some("isCoinbaseWallet"),
        }
    }

    /// The matching provider, also searching the multi-provider
    /// `ethereum.providers` array.
    fn provider(&self) -> Result<JsValue> {
        let ethereum = platform::ethereum().ok_or_else(|| anyhow!("no injected provider"))?;
        let Some(flag) = self.flag else {
            return Ok(ethereum);
        };
        if dom::flag(&ethereum, flag) {
            return Ok(ethereum);
        }
        dom::property(&ethereum, "providers")
            .map(|providers| js_sys::Array::from(&providers))
            .and_then(|providers| providers.iter().find(|p| dom::flag(p, flag)))
            .ok_or_else(|| anyhow!("no injected provider flagged {flag}"))
    }
}

#[async_trait(?Send)]
impl Connector for InjectedConnector {
    fn wallet(&self) -> WalletId {
        self.wallet
    }

    fn supports_eager(&self) -> bool {
        true
    }

    async fn connect_eagerly(&self) -> Result<Connection> {
        provider_connection(&self.provider()?, "eth_accounts").await
    }

    async fn activate(&self) -> Result<Connection> {
        provider_connection(&self.provider()?, "eth_requestAccounts").await
    }
}

// ── Safe apps ──

pub const SAFE_HANDSHAKE_TIMEOUT_MS: u32 = 1_500;
const SAFE_SDK_VERSION: &str = "7.0.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafeEnv {
    sdk_version: &'static str,
}

#[derive(Debug, Serialize)]
struct SafeRequest<'a> {
    id: &'a str,
    method: &'static str,
    env: SafeEnv,
}

#[derive(Debug, Deserialize)]
struct SafeResponse {
    id: String,
    success: bool,
    data: Option<SafeInfo>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub safe_address: String,
    pub chain_id: u64,
}

impl SafeResponse {
    fn into_info(self) -> Result<SafeInfo> {
        if !self.success {
            bail!(
                "Safe rejected getSafeInfo: {}",
                self.error.unwrap_or_else(|| "unknown error".to_owned())
            );
        }
        self.data.ok_or_else(|| anyhow!("Safe response carried no data"))
    }
}

type Settle = (js_sys::Function, js_sys::Function);

/// Ask the parent Safe frame for its address and chain.
async fn safe_info() -> Result<SafeInfo> {
    let window = dom::window();
    let parent = window
        .parent()
        .map_err(js_error)?
        .ok_or_else(|| anyhow!("no parent frame"))?;

    let request_id = format!("swapdeck-{}", js_sys::Date::now() as u64);
    let message = serde_wasm_bindgen::to_value(&SafeRequest {
        id: &request_id,
        method: "getSafeInfo",
        env: SafeEnv {
            sdk_version: SAFE_SDK_VERSION,
        },
    })
    .map_err(|err| anyhow!("failed to encode Safe request: {err}"))?;

    let settle: Rc<RefCell<Option<Settle>>> = Rc::default();
    let promise = {
        let settle = Rc::clone(&settle);
        js_sys::Promise::new(&mut move |resolve, reject| {
            *settle.borrow_mut() = Some((resolve, reject));
        })
    };

    let on_message = {
        let settle = Rc::clone(&settle);
        let request_id = request_id.clone();
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            let data = event.data();
            let matches = dom::property(&data, "id").and_then(|id| id.as_string())
                == Some(request_id.clone());
            if matches {
                if let Some((resolve, _)) = settle.borrow_mut().take() {
                    let _ = resolve.call1(&JsValue::NULL, &data);
                }
            }
        })
    };
    window
        .add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
        .map_err(js_error)?;

    let timeout = {
        let settle = Rc::clone(&settle);
        Timeout::new(SAFE_HANDSHAKE_TIMEOUT_MS, move || {
            if let Some((_, reject)) = settle.borrow_mut().take() {
                let _ = reject.call1(&JsValue::NULL, &"Safe handshake timed out".into());
            }
        })
    };

    let posted = parent.post_message(&message, "*").map_err(js_error);
    let response = match posted {
        Ok(()) => JsFuture::from(promise).await.map_err(js_error),
        Err(err) => Err(err),
    };

    drop(timeout);
    let _ = window
        .remove_event_listener_with_callback("message", on_message.as_ref().unchecked_ref());

    let response: SafeResponse = serde_wasm_bindgen::from_value(response?)
        .map_err(|err| anyhow!("malformed Safe response: {err}"))?;
    if response.id != request_id {
        bail!("Safe answered request {} instead of {request_id}", response.id);
    }
    response.into_info()
}

/// Safe apps connector; only meaningful when framed by the Safe UI.
pub struct SafeConnector;

#[async_trait(?Send)]
impl Connector for SafeConnector {
    fn wallet(&self) -> WalletId {
        WalletId::GnosisSafe
    }

    fn supports_eager(&self) -> bool {
        true
    }

    async fn connect_eagerly(&self) -> Result<Connection> {
        if !platform::in_iframe() {
            bail!("not running inside a Safe frame");
        }
        self.activate().await
    }

    async fn activate(&self) -> Result<Connection> {
        let info = safe_info().await?;
        Ok(Connection {
            chain_id: Some(ChainId(info.chain_id)),
            accounts: vec![info.safe_address],
        })
    }
}

// ── WalletConnect ──

pub const WALLETCONNECT_SESSION_KEY: &str = "walletconnect";

/// The session record a previous WalletConnect pairing left behind.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletConnectSession {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub accounts: Vec<String>,
    pub chain_id: Option<u64>,
}

impl WalletConnectSession {
    pub fn into_connection(self) -> Result<Connection> {
        if !self.connected || self.accounts.is_empty() {
            bail!("WalletConnect session is not connected");
        }
        Ok(Connection {
            chain_id: self.chain_id.map(ChainId),
            accounts: self.accounts,
        })
    }
}

pub struct WalletConnectConnector;

#[async_trait(?Send)]
impl Connector for WalletConnectConnector {
    fn wallet(&self) -> WalletId {
        WalletId::WalletConnect
    }

    fn supports_eager(&self) -> bool {
        true
    }

    async fn connect_eagerly(&self) -> Result<Connection> {
        let session: WalletConnectSession = LocalStorage::get(WALLETCONNECT_SESSION_KEY)
            .map_err(|err| anyhow!("no WalletConnect session: {err}"))?;
        session.into_connection()
    }

    async fn activate(&self) -> Result<Connection> {
        bail!("WalletConnect pairing is not available in this host")
    }
}

/// Every connector this host can offer.
pub fn registry(rpc_url: &str) -> ConnectorRegistry {
    let mut registry = ConnectorRegistry::default();
    registry.register(Rc::new(NetworkConnector::new(JsonRpcClient::new(Some(
        rpc_url.to_owned(),
    )))));
    registry.register(Rc::new(InjectedConnector::any()));
    registry.register(Rc::new(InjectedConnector::coinbase()));
    registry.register(Rc::new(WalletConnectConnector));
    if platform::in_iframe() {
        registry.register(Rc::new(SafeConnector));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walletconnect_session_restores_accounts_and_chain() {
        let session: WalletConnectSession = serde_json::from_str(
            r#"{"connected":true,"accounts":["0xabc"],"chainId":137,"bridge":"https://bridge"}"#,
        )
        .unwrap();
        let connection = session.into_connection().unwrap();
        assert_eq!(connection.chain_id, Some(ChainId::POLYGON));
        assert_eq!(connection.accounts, vec!["0xabc".to_owned()]);
    }

    #[test]
    fn stale_walletconnect_session_is_rejected() {
        let session: WalletConnectSession =
            serde_json::from_str(r#"{"connected":false,"accounts":[]}"#).unwrap();
        assert!(session.into_connection().is_err());
    }

    #[test]
    fn safe_response_parsing() {
        let ok: SafeResponse = serde_json::from_str(
            r#"{"id":"swapdeck-1","success":true,"data":{"safeAddress":"0xsafe","chainId":1,"threshold":2}}"#,
        )
        .unwrap();
        assert_eq!(
            ok.into_info().unwrap(),
            SafeInfo {
                safe_address: "0xsafe".to_owned(),
                chain_id: 1,
            }
        );

        let rejected: SafeResponse =
            serde_json::from_str(r#"{"id":"swapdeck-1","success":false,"error":"denied"}"#).unwrap();
        assert!(rejected.into_info().unwrap_err().to_string().contains("denied"));
    }
}
