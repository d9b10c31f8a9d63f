//! The brand-settings singleton.
//!
//! A single external record controls storefront copy, the WhatsApp
//! contact flow, and the USD display rate. It is fetched once and cached;
//! the orchestration layer treats it as read-only.

use serde::{Deserialize, Serialize};

use super::price::ExchangeRate;

/// Brand-wide settings, one row for the whole store.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandSettings {
    /// Display name, e.g. "Varmina Joyas".
    pub brand_name: String,
    /// WhatsApp contact number as entered by the admin; may contain
    /// formatting characters. Normalized to digits when building links.
    pub whatsapp_number: Option<String>,
    /// Optional quote-message template with `{{placeholder}}` slots.
    pub whatsapp_template: Option<String>,
    /// CLP-per-USD display rate.
    pub usd_exchange_rate: ExchangeRate,
    /// Announcement-bar text shown on the public storefront.
    pub announcement: Option<String>,
    /// Social links shown in the footer.
    pub social: SocialLinks,
    /// Brand logo URL.
    pub logo_url: Option<String>,
    /// Hero image URLs (desktop and mobile).
    pub hero_image_url: Option<String>,
    pub hero_image_mobile_url: Option<String>,
}

impl Default for BrandSettings {
    fn default() -> Self {
        Self {
            brand_name: "Varmina Joyas".to_owned(),
            whatsapp_number: None,
            whatsapp_template: None,
            usd_exchange_rate: ExchangeRate::default(),
            announcement: None,
            social: SocialLinks::default(),
            logo_url: None,
            hero_image_url: None,
            hero_image_mobile_url: None,
        }
    }
}

/// Footer social links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SocialLinks {
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
}
