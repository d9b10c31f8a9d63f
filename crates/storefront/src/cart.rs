//! Client-local shopping cart.
//!
//! Lines are keyed by (product id, variant name) and persisted to durable
//! storage on every mutation, so a reopened session resumes where it left
//! off. Lines store no prices: totals always resolve against the live
//! catalog snapshot, so a price change shows up retroactively in the cart
//! total.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use varmina_core::{Price, Product, ProductId};

use crate::services::kv::{CART_KEY, KeyValueStorage};

/// A persisted cart line: a product reference, never a product value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// A cart line resolved against the current catalog.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: u32,
    pub variant: Option<String>,
    /// Unit price at resolution time (variant override applied).
    pub unit_price: Price,
}

impl ResolvedLine {
    /// Line total at resolution time.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The shopping cart store.
///
/// Cheaply cloneable; all clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    items: Mutex<Vec<CartItem>>,
    open: AtomicBool,
    storage: Arc<dyn KeyValueStorage>,
}

impl CartStore {
    /// Build the store, restoring the persisted snapshot before any other
    /// interaction. Corrupt snapshots restore as an empty cart.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let items = storage
            .get(CART_KEY)
            .and_then(|raw| match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => Some(items),
                Err(e) => {
                    tracing::warn!(error = %e, "stored cart unreadable, starting empty");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            inner: Arc::new(CartInner {
                items: Mutex::new(items),
                open: AtomicBool::new(false),
                storage,
            }),
        }
    }

    /// Add `quantity` units of a product (optionally a named variant).
    ///
    /// An existing line with the same (product id, variant name) key is
    /// incremented; otherwise a new line is appended. Opens the cart
    /// panel so the user immediately sees what they added.
    pub fn add_item(&self, product: &Product, quantity: u32, variant: Option<&str>) {
        if quantity == 0 {
            return;
        }
        self.mutate(|items| {
            let existing = items
                .iter_mut()
                .find(|i| i.product_id == product.id && i.variant.as_deref() == variant);
            match existing {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => items.push(CartItem {
                    product_id: product.id.clone(),
                    quantity,
                    variant: variant.map(str::to_owned),
                }),
            }
        });
        self.set_open(true);
    }

    /// Set the quantity for every line of a product.
    ///
    /// Quantities below 1 remove the line entirely; zero or negative
    /// quantities are never persisted.
    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove_item(product_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.mutate(|items| {
            for line in items.iter_mut().filter(|i| &i.product_id == product_id) {
                line.quantity = quantity;
            }
        });
    }

    /// Remove every line referencing a product.
    pub fn remove_item(&self, product_id: &ProductId) {
        self.mutate(|items| items.retain(|i| &i.product_id != product_id));
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.inner
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Resolve lines against a catalog snapshot.
    ///
    /// Lines whose product id no longer resolves are skipped; they still
    /// count toward [`Self::total_items`] until removed.
    #[must_use]
    pub fn resolve(&self, products: &[Product]) -> Vec<ResolvedLine> {
        self.items()
            .into_iter()
            .filter_map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id)?;
                let unit_price = product.price_for(item.variant.as_deref());
                Some(ResolvedLine {
                    product: product.clone(),
                    quantity: item.quantity,
                    variant: item.variant,
                    unit_price,
                })
            })
            .collect()
    }

    /// Live total: sum of price x quantity against the given snapshot.
    #[must_use]
    pub fn total_price(&self, products: &[Product]) -> Price {
        self.resolve(products)
            .iter()
            .fold(Price::new(0), |acc, line| acc.plus(line.line_total()))
    }

    /// Whether the cart panel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Relaxed)
    }

    /// Open or close the cart panel.
    pub fn set_open(&self, open: bool) {
        self.inner.open.store(open, Ordering::Relaxed);
    }

    /// Run a mutation under the lock, then synchronously persist.
    fn mutate(&self, f: impl FnOnce(&mut Vec<CartItem>)) {
        let mut items = self.inner.items.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut items);
        match serde_json::to_string(&*items) {
            Ok(json) => self.inner.storage.set(CART_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize cart"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use varmina_core::{ErpMetadata, ProductStatus, Variant};

    use crate::services::MemoryStorage;

    fn product(id: &str, name: &str, clp: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            price: Price::new(clp),
            images: vec![],
            status: ProductStatus::InStock,
            collection: None,
            category: None,
            badge: None,
            variants: vec![],
            stock: None,
            whatsapp_clicks: 0,
            erp: ErpMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartStore::new(storage.clone()), storage)
    }

    #[test]
    fn same_key_increments_instead_of_duplicating() {
        let (cart, _) = store();
        let p = product("p1", "Collar Luz de Luna", 11_875_000);
        cart.add_item(&p, 1, None);
        cart.add_item(&p, 1, None);

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn distinct_variants_are_distinct_lines() {
        let (cart, _) = store();
        let p = product("p1", "Anillo Sol Real", 3_990_000);
        cart.add_item(&p, 1, Some("Oro 18k"));
        cart.add_item(&p, 1, Some("Oro 24k"));
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn add_opens_the_panel() {
        let (cart, _) = store();
        assert!(!cart.is_open());
        cart.add_item(&product("p1", "Colgante Celestial", 2_945_000), 1, None);
        assert!(cart.is_open());
    }

    #[test]
    fn quantity_floor_removes_lines() {
        let (cart, _) = store();
        let p = product("p1", "Pulsera Zafiro", 23_750_000);
        cart.add_item(&p, 3, None);

        cart.update_quantity(&p.id, 2);
        assert_eq!(cart.items()[0].quantity, 2);

        cart.update_quantity(&p.id, 0);
        assert!(cart.items().is_empty());

        cart.add_item(&p, 1, None);
        cart.update_quantity(&p.id, -5);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn totals_track_the_live_catalog() {
        let (cart, _) = store();
        let p = product("p1", "Alianza Negro Eterno", 1_710_000);
        cart.add_item(&p, 2, None);
        assert_eq!(cart.total_price(&[p.clone()]).clp(), 3_420_000);

        // A catalog price change is reflected retroactively.
        let repriced = Product {
            price: Price::new(2_000_000),
            ..p
        };
        assert_eq!(cart.total_price(&[repriced]).clp(), 4_000_000);

        // A product that no longer resolves contributes nothing.
        assert_eq!(cart.total_price(&[]).clp(), 0);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn variant_price_override_applies() {
        let (cart, _) = store();
        let mut p = product("p1", "Anillo Sol Real", 3_990_000);
        p.variants = vec![Variant {
            name: "Oro 24k".to_owned(),
            price: Price::new(4_500_000),
            images: vec![],
            stock: None,
            primary: false,
        }];
        cart.add_item(&p, 1, Some("Oro 24k"));
        assert_eq!(cart.total_price(std::slice::from_ref(&p)).clp(), 4_500_000);
    }

    #[test]
    fn persists_and_restores_across_instances() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let cart = CartStore::new(storage.clone());
            let p = product("p1", "Pendientes Jardín Secreto", 8_455_000);
            cart.add_item(&p, 2, Some("Esmeralda"));
            cart.add_item(&product("p2", "Colgante Celestial", 2_945_000), 1, None);
        }

        let restored = CartStore::new(storage);
        let items = restored.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, ProductId::new("p1"));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].variant.as_deref(), Some("Esmeralda"));
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn corrupt_snapshot_restores_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(CART_KEY, "{definitely-not-a-cart");
        let cart = CartStore::new(storage);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn clear_empties_and_persists() {
        let (cart, storage) = store();
        cart.add_item(&product("p1", "Collar", 1000), 1, None);
        cart.clear();
        assert!(cart.items().is_empty());
        assert_eq!(storage.get(CART_KEY).unwrap(), "[]");
    }
}
