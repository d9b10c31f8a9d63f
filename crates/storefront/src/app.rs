//! Composition root: every store wired to the Supabase services.
//!
//! The hosting layer builds one [`StoreApp`] at startup and passes the
//! stores down to whatever renders them; nothing here is a global.
//! `init` is latched so a hosting framework that re-invokes its setup
//! path (strict re-rendering in development does this) still produces
//! exactly one session resolution and one initial catalog load.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::config::StoreConfig;
use crate::prefs::Preferences;
use crate::services::{JsonFileStorage, KeyValueStorage, ProductService};
use crate::session::SessionGate;
use crate::supabase::{
    SupabaseAuth, SupabaseAuthorization, SupabaseClient, SupabaseError, SupabaseProducts,
    SupabaseSettings,
};
use crate::toast::ToastQueue;

/// The wired-up orchestration layer.
#[derive(Clone)]
pub struct StoreApp {
    pub toasts: ToastQueue,
    pub catalog: CatalogStore,
    pub cart: CartStore,
    pub session: SessionGate,
    pub prefs: Preferences,
    /// The product service, for the admin layer to share.
    pub products: Arc<dyn ProductService>,
    init_done: Arc<AtomicBool>,
}

impl StoreApp {
    /// Wire every store to the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built from the
    /// configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, SupabaseError> {
        let client = SupabaseClient::new(&config.supabase)?;
        let storage: Arc<dyn KeyValueStorage> =
            Arc::new(JsonFileStorage::open(&config.storage_path));

        let toasts = ToastQueue::with_ttl(config.toast_ttl);
        let products: Arc<dyn ProductService> = Arc::new(SupabaseProducts::new(client.clone()));
        let identity = Arc::new(SupabaseAuth::new(client.clone()));
        let authorization = Arc::new(SupabaseAuthorization::new(client.clone()));
        let settings = Arc::new(SupabaseSettings::new(client));

        let catalog = CatalogStore::new(
            Arc::clone(&products),
            settings,
            toasts.clone(),
            config.catalog_debounce,
            config.catalog_timeout,
        );
        let session = SessionGate::new(identity, authorization, toasts.clone(), config.auth_timeout);
        let cart = CartStore::new(Arc::clone(&storage));
        let prefs = Preferences::new(storage);

        Ok(Self {
            toasts,
            catalog,
            cart,
            session,
            prefs,
            products,
            init_done: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Resolve the session and load the catalog, at most once per
    /// process lifetime.
    pub async fn init(&self) {
        if self.init_done.swap(true, Ordering::SeqCst) {
            return;
        }
        self.session.init().await;
        self.catalog.init().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use secrecy::SecretString;
    use std::time::Duration;

    fn config() -> StoreConfig {
        let dir = std::env::temp_dir().join(format!("varmina-app-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        StoreConfig {
            supabase: SupabaseConfig {
                url: url::Url::parse("https://example.supabase.co").unwrap(),
                anon_key: SecretString::from("test-anon-key"),
            },
            storage_path: dir.join("store.json"),
            catalog_debounce: Duration::from_secs(2),
            catalog_timeout: Duration::from_secs(8),
            auth_timeout: Duration::from_secs(15),
            toast_ttl: Duration::from_secs(3),
        }
    }

    #[tokio::test]
    async fn wiring_produces_working_local_stores() {
        let app = StoreApp::new(&config()).unwrap();

        // Local state works without any backend round trip.
        assert!(app.cart.items().is_empty());
        assert!(!app.prefs.dark_mode());
        assert!(!app.session.is_admin());
        assert!(app.catalog.products().is_empty());
    }
}
