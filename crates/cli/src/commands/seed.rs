//! Catalog seeding with the demo jewelry collection.

use varmina_core::{CreateProductInput, Price, ProductStatus};
use varmina_storefront::config::StoreConfig;
use varmina_storefront::services::ProductService;
use varmina_storefront::supabase::{SupabaseClient, SupabaseProducts};

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns configuration errors; per-product insert failures are logged
/// and the run continues with the rest.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let client = SupabaseClient::new(&config.supabase)?;
    let products = SupabaseProducts::new(client);

    let mut created = 0usize;
    for input in demo_products() {
        let name = input.name.clone();
        match products.create(input).await {
            Ok(product) => {
                created += 1;
                tracing::info!(id = %product.id, name = %product.name, "seeded product");
            }
            Err(e) => tracing::error!(error = %e, name = %name, "failed to seed product"),
        }
    }

    tracing::info!(created, "seeding complete");
    Ok(())
}

/// The demo pieces, priced in pesos.
fn demo_products() -> Vec<CreateProductInput> {
    let piece = |name: &str, description: &str, price: i64, status, img_a: u32, img_b: u32| {
        CreateProductInput {
            name: name.to_owned(),
            description: Some(description.to_owned()),
            price: Price::new(price),
            images: vec![
                format!("https://picsum.photos/id/{img_a}/800/800"),
                format!("https://picsum.photos/id/{img_b}/800/800"),
            ],
            status,
            ..CreateProductInput::default()
        }
    };

    vec![
        piece(
            "Collar Luz de Luna",
            "Un impresionante collar de oro blanco de 18k con una cascada de diamantes pavé, \
             inspirado en el reflejo de la luna sobre el Sena.",
            11_875_000,
            ProductStatus::InStock,
            1,
            2,
        ),
        piece(
            "Anillo Sol Real",
            "Anillo de sello forjado a mano en oro de 24k con incrustación de ónix profundo. \
             Un símbolo de poder y elegancia.",
            3_990_000,
            ProductStatus::MadeToOrder,
            3,
            4,
        ),
        piece(
            "Pendientes Jardín Secreto",
            "Delicados pendientes de esmeralda y diamantes en forma de hojas de hiedra. \
             Engastados en platino.",
            8_455_000,
            ProductStatus::InStock,
            5,
            6,
        ),
        piece(
            "Pulsera Zafiro Océano",
            "Una pulsera fluida de zafiros talla cojín y diamantes brillantes, evocando la \
             profundidad del océano.",
            23_750_000,
            ProductStatus::SoldOut,
            7,
            8,
        ),
        piece(
            "Colgante Celestial",
            "Una perla de Tahití perfecta suspendida de una cadena de oro con un engaste de \
             diamantes.",
            2_945_000,
            ProductStatus::InStock,
            9,
            10,
        ),
        piece(
            "Alianza Negro Eterno",
            "Alianza de oro ennegrecido con diamantes negros. Moderna, discreta y sofisticada.",
            1_710_000,
            ProductStatus::MadeToOrder,
            11,
            12,
        ),
    ]
}
