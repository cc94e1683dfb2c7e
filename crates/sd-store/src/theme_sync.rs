//! Keeps `matchesDarkMode` in step with the host's colour-scheme preference.

use crate::store::PreferenceStore;
use std::rc::{Rc, Weak};

/// A registered change listener; detaching removes it from the host.
pub trait Detach {
    fn detach(self: Box<Self>);
}

/// The host's "prefers dark colour scheme" signal.
pub trait ColorSchemeSignal {
    fn prefers_dark(&self) -> bool;
    fn listen(&self, on_change: Rc<dyn Fn(bool)>) -> Box<dyn Detach>;
}

/// Fallback for hosts without a media-query API: a fixed answer, no changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticColorScheme(pub bool);

struct NoopDetach;

impl Detach for NoopDetach {
    fn detach(self: Box<Self>) {}
}

impl ColorSchemeSignal for StaticColorScheme {
    fn prefers_dark(&self) -> bool {
        self.0
    }

    fn listen(&self, _on_change: Rc<dyn Fn(bool)>) -> Box<dyn Detach> {
        Box::new(NoopDetach)
    }
}

/// Attached listener. Dropping it detaches from the signal.
pub struct ThemeSync {
    registration: Option<Box<dyn Detach>>,
}

impl ThemeSync {
    /// Write the current preference, then every change notification.
    pub fn attach(store: &Rc<PreferenceStore>, signal: &dyn ColorSchemeSignal) -> Self {
        store.set_matches_dark_mode(signal.prefers_dark());

        let weak: Weak<PreferenceStore> = Rc::downgrade(store);
        let registration = signal.listen(Rc::new(move |dark| {
            if let Some(store) = weak.upgrade() {
                store.set_matches_dark_mode(dark);
            }
        }));

        Self {
            registration: Some(registration),
        }
    }

    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.detach();
        }
    }
}

impl Drop for ThemeSync {
    fn drop(&mut self) {
        self.release();
    }
}
