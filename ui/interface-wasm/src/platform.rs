//! Host capability probing, done once at startup.

use crate::dom;
use sd_connectors::HostCapabilities;
use wasm_bindgen::JsValue;

const MOBILE_MARKERS: [&str; 6] = ["android", "iphone", "ipad", "ipod", "mobile", "opera mini"];

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let user_agent = user_agent.to_ascii_lowercase();
    MOBILE_MARKERS
        .iter()
        .any(|marker| user_agent.contains(marker))
}

/// `window.ethereum`, if a provider was injected.
pub fn ethereum() -> Option<JsValue> {
    dom::property(&dom::window(), "ethereum")
}

/// Whether the page is framed, e.g. as a Safe app.
pub fn in_iframe() -> bool {
    let window = dom::window();
    match window.top() {
        Ok(Some(top)) => JsValue::from(top) != JsValue::from(window),
        // Cross-origin access to `top` throws only when framed.
        Err(_) => true,
        Ok(None) => false,
    }
}

pub fn probe() -> HostCapabilities {
    let user_agent = dom::window().navigator().user_agent().unwrap_or_default();
    HostCapabilities {
        is_mobile: is_mobile_user_agent(&user_agent),
        has_metamask: ethereum().is_some_and(|provider| dom::flag(&provider, "isMetaMask")),
    }
}
