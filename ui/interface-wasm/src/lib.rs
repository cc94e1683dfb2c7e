//! Swapdeck browser host.
//!
//! Mounts the preference store on `localStorage`, keeps `matchesDarkMode` in
//! step with `prefers-color-scheme`, runs the wallet bootstrap once and
//! exposes the named preference updates to the page.

pub mod activation;
pub mod api;
pub mod connectors;
pub mod dom;
pub mod logging;
pub mod media;
pub mod platform;
pub mod state;
pub mod storage;
pub mod theme;

use sd_store::{PreferenceStore, ThemeSync};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
    logging::init();

    init()
}

fn init() -> Result<(), JsValue> {
    if state::is_mounted() {
        return Ok(());
    }

    let store = Rc::new(PreferenceStore::load(
        state::DateClock,
        storage::LocalStoragePersistence::default(),
    ));

    let signal = media::color_scheme_signal();
    let theme_sync = ThemeSync::attach(&store, signal.as_ref());
    let theme_subscription = theme::bind(&store);

    state::mount(Rc::clone(&store), theme_sync, theme_subscription);

    let host = platform::probe();
    let rpc_url = storage::rpc_url();
    activation::start(&store, host, &rpc_url);
    activation::refresh_block_time(&rpc_url);

    Ok(())
}

/// Tear down the mount: detaches the colour-scheme listener, drops the
/// theme binding and releases the store.
#[wasm_bindgen]
pub fn unmount() {
    state::unmount();
}
