//! Product, variant, and lifecycle status types.
//!
//! Products are immutable values fetched from the backend; all mutation
//! goes through the product service. Wire status values are the Spanish
//! labels the catalog has always stored (`Disponible`, `Por Encargo`,
//! `Agotado`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;

/// Maximum accepted product name length (characters).
pub const MAX_NAME_LEN: usize = 100;
/// Maximum accepted description length (characters).
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum accepted image upload size in bytes (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    #[default]
    #[serde(rename = "Disponible")]
    InStock,
    #[serde(rename = "Por Encargo")]
    MadeToOrder,
    #[serde(rename = "Agotado")]
    SoldOut,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "Disponible"),
            Self::MadeToOrder => write!(f, "Por Encargo"),
            Self::SoldOut => write!(f, "Agotado"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Disponible" => Ok(Self::InStock),
            "Por Encargo" => Ok(Self::MadeToOrder),
            "Agotado" => Ok(Self::SoldOut),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}

/// A priced sub-option of a product (e.g. a metal finish).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name, unique within the parent product.
    pub name: String,
    /// Price override for this variant.
    pub price: Price,
    /// Optional image subset; empty means "use the product images".
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional stock count.
    #[serde(default)]
    pub stock: Option<u32>,
    /// Default selection on display. At most one variant per product may
    /// carry this flag; the admin form enforces it at write time.
    #[serde(default)]
    pub primary: bool,
}

/// Per-row operations metadata edited inline from the assets view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ErpMetadata {
    /// Acquisition/production cost per unit, in pesos.
    #[serde(default)]
    pub unit_cost: Option<i64>,
    /// Physical storage location.
    #[serde(default)]
    pub location: Option<String>,
    /// ERP category label.
    #[serde(default)]
    pub erp_category: Option<String>,
}

impl ErpMetadata {
    /// Whether any field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.unit_cost.is_none() && self.location.is_none() && self.erp_category.is_none()
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub whatsapp_clicks: u64,
    #[serde(flatten)]
    pub erp: ErpMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The variant flagged as primary, if any.
    #[must_use]
    pub fn primary_variant(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| v.primary)
    }

    /// Look up a variant by name.
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Effective unit price for an optional variant selection.
    ///
    /// An unknown variant name falls back to the product price.
    #[must_use]
    pub fn price_for(&self, variant_name: Option<&str>) -> Price {
        variant_name
            .and_then(|name| self.variant(name))
            .map_or(self.price, |v| v.price)
    }
}

/// Validation failures raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductValidationError {
    #[error("el nombre es obligatorio")]
    EmptyName,
    #[error("el precio debe ser un número positivo")]
    NegativePrice,
    #[error("solo se permiten archivos de imagen")]
    NotAnImage,
    #[error("la imagen es demasiado grande (máximo 10MB)")]
    ImageTooLarge,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl CreateProductInput {
    /// Trim and bound the free-text fields, rejecting invalid input.
    ///
    /// # Errors
    ///
    /// Returns [`ProductValidationError::EmptyName`] when the trimmed name
    /// is empty and [`ProductValidationError::NegativePrice`] when the
    /// price is below zero.
    pub fn sanitized(mut self) -> Result<Self, ProductValidationError> {
        self.name = truncate_chars(self.name.trim(), MAX_NAME_LEN);
        if self.name.is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        if self.price.clp() < 0 {
            return Err(ProductValidationError::NegativePrice);
        }
        self.description = self
            .description
            .map(|d| truncate_chars(d.trim(), MAX_DESCRIPTION_LEN))
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

/// Partial update for an existing product. `None` fields are untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Variant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_category: Option<String>,
}

impl UpdateProductInput {
    /// Trim and bound the free-text fields, rejecting invalid input.
    ///
    /// # Errors
    ///
    /// Same rules as [`CreateProductInput::sanitized`], applied only to
    /// the fields that are present.
    pub fn sanitized(mut self) -> Result<Self, ProductValidationError> {
        if let Some(name) = self.name {
            let name = truncate_chars(name.trim(), MAX_NAME_LEN);
            if name.is_empty() {
                return Err(ProductValidationError::EmptyName);
            }
            self.name = Some(name);
        }
        if let Some(price) = self.price
            && price.clp() < 0
        {
            return Err(ProductValidationError::NegativePrice);
        }
        self.description = self
            .description
            .map(|d| truncate_chars(d.trim(), MAX_DESCRIPTION_LEN));
        Ok(self)
    }

    /// Whether the update carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.images.is_none()
            && self.status.is_none()
            && self.collection.is_none()
            && self.category.is_none()
            && self.badge.is_none()
            && self.variants.is_none()
            && self.stock.is_none()
            && self.unit_cost.is_none()
            && self.location.is_none()
            && self.erp_category.is_none()
    }
}

/// An image file staged for upload, validated before any network call.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check the type and size limits the storage bucket enforces.
    ///
    /// # Errors
    ///
    /// Returns [`ProductValidationError::NotAnImage`] for non-image
    /// content types and [`ProductValidationError::ImageTooLarge`] past
    /// the 10 MiB cap.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if !self.content_type.starts_with("image/") {
            return Err(ProductValidationError::NotAnImage);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ProductValidationError::ImageTooLarge);
        }
        Ok(())
    }

    /// File extension from the original name, lowercased.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
