//! Page-facing bindings: named preference updates and derived views.

use crate::{state, storage};
use gloo_utils::format::JsValueSerdeExt;
use sd_store::{PreferenceStore, selectors};
use sd_types::{
    Address, AllowedSlippage, ChainId, Locale, PairRecord, Percent, SlippageTolerance,
    TokenRecord, WalletId,
};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

fn mounted() -> Result<Rc<PreferenceStore>, JsValue> {
    state::store().ok_or_else(|| JsValue::from_str("preference store is not mounted"))
}

/// Through JSON, so chain-keyed maps become plain objects.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

/// What the interface renders from the document and the live chain.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DerivedView {
    dark_mode: bool,
    expert_mode: bool,
    locale: Option<Locale>,
    slippage_tolerance: SlippageTolerance,
    deadline_seconds: u64,
    transaction_deadline: Option<u64>,
    donation_link_visible: bool,
    url_warning_visible: bool,
    active_chain: Option<ChainId>,
    connected_wallets: Vec<WalletId>,
    added_tokens: Vec<TokenRecord>,
    tracked_pairs: Vec<PairRecord>,
}

/// The raw preference document.
#[wasm_bindgen]
pub fn preferences() -> Result<JsValue, JsValue> {
    to_js(&mounted()?.snapshot())
}

#[wasm_bindgen]
pub fn derived() -> Result<JsValue, JsValue> {
    let store = mounted()?;
    let active_chain = state::active_chain();
    let block_timestamp = state::block_timestamp();
    let view = store.with(|doc| DerivedView {
        dark_mode: selectors::is_dark_mode(doc),
        expert_mode: doc.user_expert_mode,
        locale: doc.user_locale.clone(),
        slippage_tolerance: doc.user_slippage_tolerance,
        deadline_seconds: selectors::effective_deadline(doc, active_chain),
        transaction_deadline: selectors::transaction_deadline(doc, active_chain, block_timestamp),
        donation_link_visible: selectors::is_donation_link_visible(doc, block_timestamp),
        url_warning_visible: selectors::url_warning_visible(doc),
        active_chain,
        connected_wallets: state::connected_wallets(),
        added_tokens: selectors::user_added_tokens(doc, active_chain),
        tracked_pairs: active_chain
            .map(|chain| selectors::tracked_pairs(doc, chain))
            .unwrap_or_default(),
    });
    to_js(&view)
}

/// Run `callback(preferences)` after every update.
#[wasm_bindgen(js_name = onPreferencesChange)]
pub fn on_preferences_change(callback: js_sys::Function) -> Result<(), JsValue> {
    mounted()?.subscribe(move |doc| {
        if let Ok(value) = to_js(doc) {
            let _ = callback.call1(&JsValue::NULL, &value);
        }
    });
    Ok(())
}

#[wasm_bindgen(js_name = selectWallet)]
pub fn select_wallet(wallet: Option<String>) -> Result<(), JsValue> {
    let wallet = wallet
        .map(|raw| raw.parse::<WalletId>())
        .transpose()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    mounted()?.set_selected_wallet(wallet);
    Ok(())
}

#[wasm_bindgen(js_name = setUserDarkMode)]
pub fn set_user_dark_mode(value: Option<bool>) -> Result<(), JsValue> {
    mounted()?.set_user_dark_mode(value);
    Ok(())
}

#[wasm_bindgen(js_name = toggleDarkMode)]
pub fn toggle_dark_mode() -> Result<(), JsValue> {
    mounted()?.toggle_dark_mode();
    Ok(())
}

#[wasm_bindgen(js_name = toggleExpertMode)]
pub fn toggle_expert_mode() -> Result<(), JsValue> {
    mounted()?.toggle_expert_mode();
    Ok(())
}

#[wasm_bindgen(js_name = setLocale)]
pub fn set_locale(tag: &str) -> Result<(), JsValue> {
    let locale = Locale::parse(tag).map_err(|err| JsValue::from_str(&err.to_string()))?;
    mounted()?.set_locale(locale);
    Ok(())
}

/// `numerator / denominator` as a fraction; no numerator means `"auto"`.
#[wasm_bindgen(js_name = setSlippageTolerance)]
pub fn set_slippage_tolerance(numerator: Option<u32>, denominator: u32) -> Result<(), JsValue> {
    let value = match numerator {
        None => AllowedSlippage::Auto,
        Some(numerator) => AllowedSlippage::Percent(Percent::new(
            u128::from(numerator),
            u128::from(denominator),
        )),
    };
    mounted()?.set_slippage_tolerance_percent(value);
    Ok(())
}

#[wasm_bindgen(js_name = setDeadline)]
pub fn set_deadline(seconds: u32) -> Result<(), JsValue> {
    mounted()?.set_deadline(u64::from(seconds));
    Ok(())
}

#[wasm_bindgen(js_name = setClientSideRouter)]
pub fn set_client_side_router(value: bool) -> Result<(), JsValue> {
    mounted()?.set_client_side_router(value);
    Ok(())
}

#[wasm_bindgen(js_name = setHideClosedPositions)]
pub fn set_hide_closed_positions(value: bool) -> Result<(), JsValue> {
    mounted()?.set_hide_closed_positions(value);
    Ok(())
}

#[wasm_bindgen(js_name = setShowSurveyPopup)]
pub fn set_show_survey_popup(value: Option<bool>) -> Result<(), JsValue> {
    mounted()?.set_show_survey_popup(value);
    Ok(())
}

#[wasm_bindgen(js_name = setShowDonationLink)]
pub fn set_show_donation_link(value: bool) -> Result<(), JsValue> {
    mounted()?.set_show_donation_link(value);
    Ok(())
}

#[wasm_bindgen(js_name = toggleUrlWarning)]
pub fn toggle_url_warning() -> Result<(), JsValue> {
    mounted()?.toggle_url_warning();
    Ok(())
}

#[wasm_bindgen(js_name = addToken)]
pub fn add_token(token: JsValue) -> Result<(), JsValue> {
    let token: TokenRecord = from_js(token)?;
    mounted()?.add_token(token);
    Ok(())
}

#[wasm_bindgen(js_name = removeToken)]
pub fn remove_token(chain_id: u32, address: String) -> Result<(), JsValue> {
    mounted()?.remove_token(ChainId(u64::from(chain_id)), Address::new(address));
    Ok(())
}

#[wasm_bindgen(js_name = addPair)]
pub fn add_pair(pair: JsValue) -> Result<(), JsValue> {
    let pair: PairRecord = from_js(pair)?;
    mounted()?.add_pair(pair);
    Ok(())
}

#[wasm_bindgen(js_name = removePair)]
pub fn remove_pair(chain_id: u32, token_a: String, token_b: String) -> Result<(), JsValue> {
    mounted()?.remove_pair(
        ChainId(u64::from(chain_id)),
        Address::new(token_a),
        Address::new(token_b),
    );
    Ok(())
}

/// Takes effect on the next mount.
#[wasm_bindgen(js_name = setRpcUrl)]
pub fn set_rpc_url(url: &str) -> Result<(), JsValue> {
    storage::set_rpc_url(url).map_err(|err| JsValue::from_str(&format!("{err:#}")))
}
