//! Wire rows and row-to-domain conversions.
//!
//! PostgREST rows are tolerant mirrors of the tables: optional wherever
//! the column may be null or missing so that one odd row never fails a
//! whole catalog fetch. Unknown status labels degrade to the default
//! with a warning rather than erroring.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use varmina_core::{
    AssetId, BrandSettings, ErpMetadata, ExchangeRate, InternalAsset, Price, Product, ProductId,
    ProductStatus, SocialLinks, Variant,
};

/// A `products` row as PostgREST returns it.
#[derive(Debug, Deserialize)]
pub(super) struct ProductRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub variants: Option<Vec<VariantRow>>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub whatsapp_clicks: Option<i64>,
    #[serde(default)]
    pub unit_cost: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub erp_category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A variant entry inside the `variants` jsonb column.
#[derive(Debug, Deserialize)]
pub(super) struct VariantRow {
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub primary: Option<bool>,
}

pub(super) fn convert_product(row: ProductRow) -> Product {
    let status = row.status.as_deref().map_or_else(ProductStatus::default, |s| {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(id = %row.id, status = s, "unknown product status, using default");
            ProductStatus::default()
        })
    });

    let price = Price::new(row.price);
    let variants = row
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(|v| convert_variant(v, price))
        .collect();

    Product {
        id: ProductId::new(row.id),
        name: row.name,
        description: row.description.unwrap_or_default(),
        price,
        images: row.images.unwrap_or_default(),
        status,
        collection: row.collection,
        category: row.category,
        badge: row.badge,
        variants,
        stock: row.stock.and_then(|s| u32::try_from(s).ok()),
        whatsapp_clicks: row.whatsapp_clicks.and_then(|c| u64::try_from(c).ok()).unwrap_or(0),
        erp: ErpMetadata {
            unit_cost: row.unit_cost,
            location: row.location,
            erp_category: row.erp_category,
        },
        created_at: row.created_at,
        updated_at: row.updated_at.unwrap_or(row.created_at),
    }
}

/// Legacy variant entries may lack a price; they inherit the parent's.
fn convert_variant(row: VariantRow, parent_price: Price) -> Variant {
    Variant {
        name: row.name,
        price: row.price.map_or(parent_price, Price::new),
        images: row.images.unwrap_or_default(),
        stock: row.stock.and_then(|s| u32::try_from(s).ok()),
        primary: row.primary.unwrap_or(false),
    }
}

/// The `brand_settings` singleton row.
#[derive(Debug, Deserialize)]
pub(super) struct SettingsRow {
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub whatsapp_template: Option<String>,
    #[serde(default)]
    pub usd_exchange_rate: Option<f64>,
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub tiktok_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub hero_image_mobile_url: Option<String>,
}

pub(super) fn convert_settings(row: SettingsRow) -> BrandSettings {
    let defaults = BrandSettings::default();
    BrandSettings {
        brand_name: row.brand_name.unwrap_or(defaults.brand_name),
        whatsapp_number: row.whatsapp_number,
        whatsapp_template: row.whatsapp_template,
        usd_exchange_rate: row
            .usd_exchange_rate
            .map_or_else(ExchangeRate::default, ExchangeRate::from_f64),
        announcement: row.announcement,
        social: SocialLinks {
            instagram: row.instagram_url,
            facebook: row.facebook_url,
            tiktok: row.tiktok_url,
        },
        logo_url: row.logo_url,
        hero_image_url: row.hero_image_url,
        hero_image_mobile_url: row.hero_image_mobile_url,
    }
}

/// An `internal_assets` row.
#[derive(Debug, Deserialize)]
pub(super) struct AssetRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub unit_cost: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

pub(super) fn convert_asset(row: AssetRow) -> InternalAsset {
    InternalAsset {
        id: AssetId::new(row.id),
        name: row.name,
        category: row.category.unwrap_or_else(|| "Insumos".to_owned()),
        description: row.description,
        stock: row.stock.and_then(|s| u32::try_from(s).ok()).unwrap_or(0),
        min_stock: row.min_stock.and_then(|s| u32::try_from(s).ok()).unwrap_or(0),
        unit_cost: row.unit_cost.unwrap_or(0),
        location: row.location,
        images: row.images.unwrap_or_default(),
        created_at: row.created_at,
    }
}
