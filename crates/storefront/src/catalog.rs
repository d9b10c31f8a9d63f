//! Catalog store: the single source of truth for products and brand
//! settings, shared by the public storefront and the admin views.
//!
//! Refreshes are debounced (several mounted views asking at once produce
//! one fetch), raced against a fixed deadline (a slow backend degrades to
//! the previous snapshot, never a hung UI), and committed atomically
//! (readers always see a full snapshot, never a half-updated list).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use varmina_core::{BrandSettings, Product, ProductId};

use crate::services::{ProductService, SettingsService};
use crate::timeout::{Generation, with_timeout};
use crate::toast::ToastQueue;

/// Catalog and settings snapshot store.
///
/// Cheaply cloneable; all clones share the same snapshot.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    products: RwLock<Arc<Vec<Product>>>,
    settings: RwLock<Arc<BrandSettings>>,
    loading: AtomicBool,
    last_refresh: Mutex<Option<Instant>>,
    generation: Generation,
    product_svc: Arc<dyn ProductService>,
    settings_svc: Arc<dyn SettingsService>,
    toasts: ToastQueue,
    debounce: Duration,
    fetch_timeout: Duration,
}

impl CatalogStore {
    /// Create a store around the given services.
    ///
    /// `debounce` is the window in which repeated `refresh` calls are
    /// no-ops; `fetch_timeout` bounds every backend fetch.
    #[must_use]
    pub fn new(
        product_svc: Arc<dyn ProductService>,
        settings_svc: Arc<dyn SettingsService>,
        toasts: ToastQueue,
        debounce: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                products: RwLock::new(Arc::new(Vec::new())),
                settings: RwLock::new(Arc::new(BrandSettings::default())),
                loading: AtomicBool::new(false),
                last_refresh: Mutex::new(None),
                generation: Generation::new(),
                product_svc,
                settings_svc,
                toasts,
                debounce,
                fetch_timeout,
            }),
        }
    }

    /// Initial load: forced product refresh plus the settings singleton.
    pub async fn init(&self) {
        self.refresh(true, false).await;
        self.refresh_settings().await;
    }

    /// Fetch the product list and replace the snapshot.
    ///
    /// Within the debounce window the call is a no-op unless `force` is
    /// set. With `silent`, the loading flag stays untouched and failures
    /// are logged but not toasted (background revalidation). Failures
    /// never propagate; the previous snapshot stays in place.
    pub async fn refresh(&self, force: bool, silent: bool) {
        if !force && self.recently_refreshed() {
            return;
        }

        // Claim a ticket so a stale completion cannot clobber a newer one.
        let ticket = self.inner.generation.begin();
        if !silent {
            self.inner.loading.store(true, Ordering::SeqCst);
        }

        let result = with_timeout(self.inner.fetch_timeout, self.inner.product_svc.get_all()).await;

        if self.inner.generation.is_current(ticket) {
            match result {
                Some(Ok(products)) => {
                    let snapshot = Arc::new(products);
                    if let Ok(mut guard) = self.inner.products.write() {
                        *guard = snapshot;
                    }
                    if let Ok(mut stamp) = self.inner.last_refresh.lock() {
                        *stamp = Some(Instant::now());
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "product refresh failed");
                    if !silent {
                        self.inner.toasts.error("Error al cargar los productos");
                    }
                }
                None => {
                    tracing::warn!(
                        timeout_ms = self.inner.fetch_timeout.as_millis(),
                        "product refresh timed out, keeping previous snapshot"
                    );
                    if !silent {
                        self.inner.toasts.error("Error al cargar los productos");
                    }
                }
            }
        }

        // Always leave the loading state, even when the result was stale.
        if !silent {
            self.inner.loading.store(false, Ordering::SeqCst);
        }
    }

    /// Fetch the brand-settings singleton.
    ///
    /// Absence (or any failure) leaves the prior cached value untouched;
    /// settings reads are always background and never toast.
    pub async fn refresh_settings(&self) {
        let result = with_timeout(
            self.inner.fetch_timeout,
            self.inner.settings_svc.get_settings(),
        )
        .await;

        match result {
            Some(Ok(Some(settings))) => {
                if let Ok(mut guard) = self.inner.settings.write() {
                    *guard = Arc::new(settings);
                }
            }
            Some(Ok(None)) => {}
            Some(Err(e)) => tracing::warn!(error = %e, "settings fetch failed, keeping cache"),
            None => tracing::warn!("settings fetch timed out, keeping cache"),
        }
    }

    /// Current product snapshot.
    #[must_use]
    pub fn products(&self) -> Arc<Vec<Product>> {
        self.inner
            .products
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_default()
    }

    /// Look up one product in the current snapshot.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<Product> {
        self.products().iter().find(|p| &p.id == id).cloned()
    }

    /// Current brand settings (defaults until the first successful fetch).
    #[must_use]
    pub fn settings(&self) -> Arc<BrandSettings> {
        self.inner
            .settings
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_default()
    }

    /// Whether a non-silent refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Patch one product in place (optimistic update after a successful
    /// write). Unknown ids are ignored; the next full refresh reconciles.
    pub fn patch(&self, product: Product) {
        let Ok(mut guard) = self.inner.products.write() else {
            return;
        };
        if !guard.iter().any(|p| p.id == product.id) {
            return;
        }
        let patched: Vec<Product> = guard
            .iter()
            .map(|p| {
                if p.id == product.id {
                    product.clone()
                } else {
                    p.clone()
                }
            })
            .collect();
        *guard = Arc::new(patched);
    }

    /// Record a WhatsApp consultation click, fire-and-forget.
    pub async fn record_whatsapp_click(&self, id: &ProductId) {
        if let Err(e) = self.inner.product_svc.increment_whatsapp_clicks(id).await {
            tracing::debug!(error = %e, product = %id, "whatsapp click not recorded");
        }
    }

    fn recently_refreshed(&self) -> bool {
        self.inner
            .last_refresh
            .lock()
            .ok()
            .and_then(|stamp| *stamp)
            .is_some_and(|at| at.elapsed() < self.inner.debounce)
    }
}
