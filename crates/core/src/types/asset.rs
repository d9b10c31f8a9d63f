//! Internal (back-office) assets.
//!
//! Supplies, packaging, tools - stock the brand tracks internally but
//! never sells. Asset image URLs participate in storage garbage
//! collection alongside product images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::AssetId;

/// An internal stock item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalAsset {
    pub id: AssetId,
    pub name: String,
    /// Free-form category label, e.g. "Insumos" or "Packaging".
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: u32,
    /// Restock warning threshold.
    #[serde(default)]
    pub min_stock: u32,
    /// Acquisition cost per unit, in pesos.
    #[serde(default)]
    pub unit_cost: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl InternalAsset {
    /// Whether stock has fallen to the warning threshold.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Input for creating or replacing an internal asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssetInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub min_stock: u32,
    #[serde(default)]
    pub unit_cost: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}
