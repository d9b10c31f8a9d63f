//! Internal-asset service over the `internal_assets` table.

use async_trait::async_trait;
use url::Url;

use varmina_core::{AssetId, AssetInput, InternalAsset};

use crate::services::{AssetService, ServiceError};

use super::rows::{AssetRow, convert_asset};
use super::{SupabaseClient, SupabaseError};

/// `AssetService` backed by the `internal_assets` table.
#[derive(Clone)]
pub struct SupabaseAssets {
    client: SupabaseClient,
}

impl SupabaseAssets {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(&self) -> Result<Url, SupabaseError> {
        self.client.endpoint("rest/v1/internal_assets")
    }

    async fn mutate_returning(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<InternalAsset, ServiceError> {
        let rows: Vec<AssetRow> = self
            .client
            .send(request.header("Prefer", "return=representation"))
            .await?
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
            .map_err(ServiceError::from)?;
        rows.into_iter()
            .next()
            .map(convert_asset)
            .ok_or_else(|| ServiceError::Backend("mutation returned no row".to_owned()))
    }
}

#[async_trait]
impl AssetService for SupabaseAssets {
    async fn get_all(&self) -> Result<Vec<InternalAsset>, ServiceError> {
        let mut url = self.table()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let rows: Vec<AssetRow> = self.client.get_json(url).await?;
        Ok(rows.into_iter().map(convert_asset).collect())
    }

    async fn create(&self, input: AssetInput) -> Result<InternalAsset, ServiceError> {
        let url = self.table()?;
        self.mutate_returning(self.client.http().post(url).json(&input))
            .await
    }

    async fn update(&self, id: &AssetId, input: AssetInput) -> Result<InternalAsset, ServiceError> {
        let mut url = self.table()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.mutate_returning(self.client.http().patch(url).json(&input))
            .await
    }

    async fn delete(&self, id: &AssetId) -> Result<(), ServiceError> {
        let mut url = self.table()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.client.send(self.client.http().delete(url)).await?;
        Ok(())
    }
}
