//! The guest shopping flow: browse, fill the cart, request a WhatsApp
//! quote.

use std::sync::Arc;

use varmina_core::{BrandSettings, Currency, ExchangeRate};
use varmina_integration_tests::product;
use varmina_storefront::cart::CartStore;
use varmina_storefront::quote::cart_quote_url;
use varmina_storefront::services::MemoryStorage;

fn settings() -> BrandSettings {
    BrandSettings {
        whatsapp_number: Some("56900000000".to_owned()),
        usd_exchange_rate: ExchangeRate::from_f64(950.0),
        ..BrandSettings::default()
    }
}

#[test]
fn guest_browses_and_requests_a_quote() {
    let cart = CartStore::new(Arc::new(MemoryStorage::new()));
    let piece = product("9f0c2a51-1b44", "Collar Luz de Luna", 11_875_000);
    let catalog = vec![piece.clone()];

    // Empty cart to start.
    assert_eq!(cart.total_items(), 0);
    assert!(!cart.is_open());

    // First add opens the panel.
    cart.add_item(&piece, 1, None);
    assert!(cart.is_open());
    assert_eq!(cart.total_items(), 1);

    // Same product + variant again: one line, quantity two.
    cart.add_item(&piece, 1, None);
    assert_eq!(cart.total_items(), 2);
    assert_eq!(cart.items().len(), 1);

    // The quote link carries the pieces and the formatted total.
    let lines = cart.resolve(&catalog);
    let url = cart_quote_url(&settings(), &lines, Currency::Clp).unwrap();
    assert!(url.as_str().starts_with("https://wa.me/56900000000?text="));

    let decoded = urlencoding::decode(url.as_str()).unwrap();
    assert!(decoded.contains("Collar Luz de Luna"));
    assert!(decoded.contains("(x2)"));
    assert!(decoded.contains("Total Estimado: $23.750.000"));
}

#[test]
fn quote_reflects_live_catalog_prices() {
    let cart = CartStore::new(Arc::new(MemoryStorage::new()));
    let piece = product("p1", "Anillo Sol Real", 3_990_000);
    cart.add_item(&piece, 1, None);

    // The price changes in the catalog after the add; the quote follows
    // the live price, not an add-time snapshot.
    let repriced = vec![product("p1", "Anillo Sol Real", 4_500_000)];
    let lines = cart.resolve(&repriced);
    let decoded = urlencoding::decode(
        cart_quote_url(&settings(), &lines, Currency::Clp)
            .unwrap()
            .as_str(),
    )
    .unwrap()
    .into_owned();
    assert!(decoded.contains("Total Estimado: $4.500.000"));
}

#[test]
fn cart_survives_a_new_session() {
    let storage = Arc::new(MemoryStorage::new());
    {
        let cart = CartStore::new(storage.clone());
        cart.add_item(&product("p1", "Colgante Celestial", 2_945_000), 2, None);
        cart.add_item(
            &product("p2", "Alianza Negro Eterno", 1_710_000),
            1,
            Some("Oro Negro"),
        );
    }

    let restored = CartStore::new(storage);
    let items = restored.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].variant.as_deref(), Some("Oro Negro"));
    assert!(!restored.is_open(), "panel state is not persisted");
}
