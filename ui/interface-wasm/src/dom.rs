//! DOM helpers.

use wasm_bindgen::JsValue;

pub fn window() -> web_sys::Window {
    gloo_utils::window()
}

/// `<html>`, where page-wide classes live.
pub fn root_element() -> Option<web_sys::Element> {
    gloo_utils::document().document_element()
}

/// Add or remove `class` on the root element.
pub fn set_root_class(class: &str, enabled: bool) {
    if let Some(root) = root_element() {
        let _ = root.class_list().toggle_with_force(class, enabled);
    }
}

/// Read `target[key]`, treating `undefined` and `null` as absent.
pub fn property(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// `target[key] === true`.
pub fn flag(target: &JsValue, key: &str) -> bool {
    property(target, key).and_then(|value| value.as_bool()) == Some(true)
}
