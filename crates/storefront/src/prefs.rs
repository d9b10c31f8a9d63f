//! Viewer preferences: dark mode and display currency.
//!
//! Dark mode is persisted under its own storage key so it survives a
//! reload; the currency toggle is session-local by design (prices are
//! quoted in pesos, USD is a courtesy conversion).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use varmina_core::Currency;

use crate::services::kv::{DARK_MODE_KEY, KeyValueStorage};

/// Viewer preference store.
#[derive(Clone)]
pub struct Preferences {
    inner: Arc<PrefsInner>,
}

struct PrefsInner {
    dark_mode: AtomicBool,
    currency: Mutex<Currency>,
    storage: Arc<dyn KeyValueStorage>,
}

impl Preferences {
    /// Build the store, restoring the persisted dark-mode flag.
    ///
    /// Anything other than a stored `true` (including corrupt data)
    /// restores as light mode.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let dark = storage
            .get(DARK_MODE_KEY)
            .is_some_and(|raw| raw.trim() == "true");
        Self {
            inner: Arc::new(PrefsInner {
                dark_mode: AtomicBool::new(dark),
                currency: Mutex::new(Currency::Clp),
                storage,
            }),
        }
    }

    /// Whether dark mode is active.
    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.inner.dark_mode.load(Ordering::Relaxed)
    }

    /// Flip dark mode and persist the new value.
    pub fn toggle_dark_mode(&self) -> bool {
        let next = !self.inner.dark_mode.fetch_xor(true, Ordering::Relaxed);
        self.inner
            .storage
            .set(DARK_MODE_KEY, if next { "true" } else { "false" });
        next
    }

    /// Current display currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.inner
            .currency
            .lock()
            .map_or(Currency::Clp, |guard| *guard)
    }

    /// Flip between CLP and USD.
    pub fn toggle_currency(&self) -> Currency {
        let Ok(mut guard) = self.inner.currency.lock() else {
            return Currency::Clp;
        };
        *guard = guard.toggled();
        *guard
    }
}
