//! `prefers-color-scheme` signal over `window.matchMedia`.
//!
//! Listener style is probed once: `addEventListener('change')` where the
//! query list is an event target, the legacy `addListener` otherwise.

use crate::dom;
use sd_store::{ColorSchemeSignal, Detach, StaticColorScheme};
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MediaQueryList, MediaQueryListEvent};

pub const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListenerStyle {
    EventTarget,
    Legacy,
}

pub struct MediaQueryColorScheme {
    query: MediaQueryList,
    style: ListenerStyle,
}

impl MediaQueryColorScheme {
    fn new(query: MediaQueryList) -> Self {
        let style = if dom::property(&query, "addEventListener").is_some() {
            ListenerStyle::EventTarget
        } else {
            ListenerStyle::Legacy
        };
        Self { query, style }
    }
}

struct MediaRegistration {
    query: MediaQueryList,
    style: ListenerStyle,
    callback: Closure<dyn FnMut(MediaQueryListEvent)>,
}

impl Detach for MediaRegistration {
    fn detach(self: Box<Self>) {
        let callback: &js_sys::Function = self.callback.as_ref().unchecked_ref();
        let result = match self.style {
            ListenerStyle::EventTarget => self
                .query
                .remove_event_listener_with_callback("change", callback),
            ListenerStyle::Legacy => self.query.remove_listener_with_opt_callback(Some(callback)),
        };
        if let Err(err) = result {
            debug!("failed to detach colour-scheme listener: {err:?}");
        }
    }
}

impl ColorSchemeSignal for MediaQueryColorScheme {
    fn prefers_dark(&self) -> bool {
        self.query.matches()
    }

    fn listen(&self, on_change: Rc<dyn Fn(bool)>) -> Box<dyn Detach> {
        let callback = Closure::<dyn FnMut(MediaQueryListEvent)>::new(
            move |event: MediaQueryListEvent| on_change(event.matches()),
        );
        let function: &js_sys::Function = callback.as_ref().unchecked_ref();
        let result = match self.style {
            ListenerStyle::EventTarget => self
                .query
                .add_event_listener_with_callback("change", function),
            ListenerStyle::Legacy => self.query.add_listener_with_opt_callback(Some(function)),
        };
        if let Err(err) = result {
            debug!("failed to attach colour-scheme listener: {err:?}");
        }

        Box::new(MediaRegistration {
            query: self.query.clone(),
            style: self.style,
            callback,
        })
    }
}

/// The media-query signal, or a fixed light scheme without `matchMedia`.
pub fn color_scheme_signal() -> Box<dyn ColorSchemeSignal> {
    match dom::window().match_media(DARK_SCHEME_QUERY) {
        Ok(Some(query)) => Box::new(MediaQueryColorScheme::new(query)),
        Ok(None) | Err(_) => {
            debug!("matchMedia unavailable, using a static colour scheme");
            Box::new(StaticColorScheme(false))
        }
    }
}
