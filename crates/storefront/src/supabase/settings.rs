//! Brand-settings singleton read.

use async_trait::async_trait;

use varmina_core::BrandSettings;

use crate::services::{ServiceError, SettingsService};

use super::SupabaseClient;
use super::rows::{SettingsRow, convert_settings};

/// `SettingsService` backed by the `brand_settings` table.
#[derive(Clone)]
pub struct SupabaseSettings {
    client: SupabaseClient,
}

impl SupabaseSettings {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsService for SupabaseSettings {
    async fn get_settings(&self) -> Result<Option<BrandSettings>, ServiceError> {
        let mut url = self.client.endpoint("rest/v1/brand_settings")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", "1");

        let rows: Vec<SettingsRow> = self.client.get_json(url).await?;
        Ok(rows.into_iter().next().map(convert_settings))
    }
}
