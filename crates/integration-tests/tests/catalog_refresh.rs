//! Catalog store behavior: debounce, timeout fallback, silent mode, and
//! atomic snapshot replacement.

use std::sync::Arc;
use std::time::Duration;

use varmina_core::{BrandSettings, ProductId, ToastKind};
use varmina_integration_tests::{InMemoryProductService, InMemorySettingsService, product};
use varmina_storefront::catalog::CatalogStore;
use varmina_storefront::services::ProductService;
use varmina_storefront::toast::ToastQueue;

const DEBOUNCE: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_millis(100);

fn catalog(
    products: Arc<InMemoryProductService>,
    settings: Arc<InMemorySettingsService>,
) -> (CatalogStore, ToastQueue) {
    let toasts = ToastQueue::with_ttl(Duration::from_secs(60));
    let store = CatalogStore::new(products, settings, toasts.clone(), DEBOUNCE, FETCH_TIMEOUT);
    (store, toasts)
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test]
async fn second_refresh_within_window_is_a_no_op() {
    let service = Arc::new(InMemoryProductService::with_products(vec![product(
        "p1",
        "Collar Luz de Luna",
        11_875_000,
    )]));
    let (store, _toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(false, false).await;
    store.refresh(false, false).await;

    assert_eq!(service.fetches(), 1);
    assert_eq!(store.products().len(), 1);
}

#[tokio::test]
async fn forced_refresh_bypasses_the_window() {
    let service = Arc::new(InMemoryProductService::default());
    let (store, _toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(false, false).await;
    store.refresh(true, false).await;

    assert_eq!(service.fetches(), 2);
}

#[tokio::test]
async fn failed_refresh_does_not_arm_the_debounce() {
    let service = Arc::new(InMemoryProductService::default());
    service.set_fail_fetch(true);
    let (store, _toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(false, false).await;
    service.set_fail_fetch(false);
    store.refresh(false, false).await;

    // The failure left no successful-completion stamp, so the retry ran.
    assert_eq!(service.fetches(), 2);
}

// =============================================================================
// Timeout & failure fallback
// =============================================================================

#[tokio::test]
async fn timeout_keeps_the_previous_snapshot() {
    let service = Arc::new(InMemoryProductService::with_products(vec![product(
        "p1",
        "Anillo Sol Real",
        3_990_000,
    )]));
    let (store, toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(true, false).await;
    assert_eq!(store.products().len(), 1);

    service.set_fetch_delay(Some(Duration::from_secs(5)));
    store.refresh(true, false).await;

    assert_eq!(store.products().len(), 1, "snapshot must survive a timeout");
    assert!(!store.is_loading(), "loading must clear after the fallback");
    assert_eq!(toasts.len(), 1);
}

#[tokio::test]
async fn failures_toast_unless_silent() {
    let service = Arc::new(InMemoryProductService::default());
    service.set_fail_fetch(true);
    let (store, toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(true, true).await;
    assert!(toasts.is_empty(), "silent refreshes never toast");

    store.refresh(true, false).await;
    let snapshot = toasts.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].kind, ToastKind::Error);
    assert_eq!(snapshot[0].message, "Error al cargar los productos");
}

// =============================================================================
// Snapshot semantics
// =============================================================================

#[tokio::test]
async fn successful_refresh_replaces_the_whole_snapshot() {
    let service = Arc::new(InMemoryProductService::with_products(vec![
        product("p1", "Collar Luz de Luna", 11_875_000),
        product("p2", "Anillo Sol Real", 3_990_000),
    ]));
    let (store, _toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.refresh(true, false).await;
    let before = store.products();
    assert_eq!(before.len(), 2);

    // Readers holding the old snapshot keep a consistent view while the
    // store swaps in a new one.
    service.delete(&before[0].id).await.unwrap();
    store.refresh(true, false).await;

    assert_eq!(before.len(), 2, "old snapshot is immutable");
    assert_eq!(store.products().len(), 1);
}

#[tokio::test]
async fn patch_replaces_one_product_in_place() {
    let service = Arc::new(InMemoryProductService::with_products(vec![
        product("p1", "Collar Luz de Luna", 11_875_000),
        product("p2", "Anillo Sol Real", 3_990_000),
    ]));
    let (store, _toasts) = catalog(service, Arc::new(InMemorySettingsService::default()));
    store.refresh(true, false).await;

    let mut patched = product("p2", "Anillo Sol Real", 4_200_000);
    patched.created_at = store.products()[1].created_at;
    store.patch(patched);

    assert_eq!(store.products()[1].price.clp(), 4_200_000);
    assert_eq!(store.products()[0].price.clp(), 11_875_000);

    // Unknown ids are ignored.
    store.patch(product("ghost", "Fantasma", 1));
    assert_eq!(store.products().len(), 2);
}

#[tokio::test]
async fn whatsapp_clicks_are_recorded_fire_and_forget() {
    let service = Arc::new(InMemoryProductService::with_products(vec![product(
        "p1",
        "Collar Luz de Luna",
        11_875_000,
    )]));
    let (store, toasts) = catalog(service.clone(), Arc::new(InMemorySettingsService::default()));

    store.record_whatsapp_click(&ProductId::new("p1")).await;
    assert_eq!(service.rows()[0].whatsapp_clicks, 1);

    // A failing counter write is invisible to the shopper.
    service.set_fail_mutations(true);
    store.record_whatsapp_click(&ProductId::new("p1")).await;
    assert!(toasts.is_empty());
}

// =============================================================================
// Settings cache
// =============================================================================

#[tokio::test]
async fn settings_absence_and_errors_keep_the_cache() {
    let settings_svc = Arc::new(InMemorySettingsService::with_settings(BrandSettings {
        whatsapp_number: Some("56900000000".to_owned()),
        ..BrandSettings::default()
    }));
    let (store, _toasts) = catalog(Arc::new(InMemoryProductService::default()), settings_svc.clone());

    store.refresh_settings().await;
    assert_eq!(
        store.settings().whatsapp_number.as_deref(),
        Some("56900000000")
    );

    settings_svc.set_settings(None);
    store.refresh_settings().await;
    assert_eq!(
        store.settings().whatsapp_number.as_deref(),
        Some("56900000000"),
        "a missing row keeps the cached value"
    );

    settings_svc.set_fail(true);
    store.refresh_settings().await;
    assert_eq!(
        store.settings().whatsapp_number.as_deref(),
        Some("56900000000"),
        "an errored fetch keeps the cached value"
    );
}
