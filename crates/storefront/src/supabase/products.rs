//! Product service over PostgREST rows and the storage bucket.
//!
//! Validation runs before any network call; the backend only ever sees
//! input that already passed the same checks the admin forms apply.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use varmina_core::{
    CreateProductInput, ImageUpload, Product, ProductId, ProductStatus, UpdateProductInput,
};

use crate::services::{ProductService, ServiceError};

use super::rows::{ProductRow, convert_product};
use super::{SupabaseClient, SupabaseError, storage};

/// PostgREST preference header asking for the mutated rows back.
const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// `ProductService` backed by the `products` table.
#[derive(Clone)]
pub struct SupabaseProducts {
    client: SupabaseClient,
}

impl SupabaseProducts {
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(&self) -> Result<Url, SupabaseError> {
        self.client.endpoint("rest/v1/products")
    }

    fn table_for_id(&self, id: &ProductId) -> Result<Url, SupabaseError> {
        let mut url = self.table()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn table_for_ids(&self, ids: &[ProductId]) -> Result<Url, SupabaseError> {
        let joined = ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self.table()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("in.({joined})"));
        Ok(url)
    }

    async fn get_by_id(&self, id: &ProductId) -> Result<Product, SupabaseError> {
        let mut url = self.table_for_id(id)?;
        url.query_pairs_mut().append_pair("select", "*");
        let rows: Vec<ProductRow> = self.client.get_json(url).await?;
        rows.into_iter()
            .next()
            .map(convert_product)
            .ok_or_else(|| SupabaseError::RowNotFound(format!("product {id}")))
    }

    /// PATCH one row and return the mutated product.
    async fn patch_row(
        &self,
        id: &ProductId,
        body: &serde_json::Value,
    ) -> Result<Product, SupabaseError> {
        let url = self.table_for_id(id)?;
        let request = self
            .client
            .http()
            .patch(url)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(body);
        let rows: Vec<ProductRow> = self
            .client
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))?;
        rows.into_iter()
            .next()
            .map(convert_product)
            .ok_or_else(|| SupabaseError::RowNotFound(format!("product {id}")))
    }
}

#[async_trait]
impl ProductService for SupabaseProducts {
    async fn get_all(&self) -> Result<Vec<Product>, ServiceError> {
        let mut url = self.table()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let rows: Vec<ProductRow> = self.client.get_json(url).await?;
        Ok(rows.into_iter().map(convert_product).collect())
    }

    async fn create(&self, input: CreateProductInput) -> Result<Product, ServiceError> {
        let input = input.sanitized()?;
        let url = self.table()?;
        let request = self
            .client
            .http()
            .post(url)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&input);
        let rows: Vec<ProductRow> = self
            .client
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
            .map_err(ServiceError::from)?;
        rows.into_iter()
            .next()
            .map(convert_product)
            .ok_or_else(|| ServiceError::Backend("create returned no row".to_owned()))
    }

    async fn update(
        &self,
        id: &ProductId,
        updates: UpdateProductInput,
    ) -> Result<Product, ServiceError> {
        let updates = updates.sanitized()?;
        if updates.is_empty() {
            // Nothing to write; hand back the current row.
            return Ok(self.get_by_id(id).await?);
        }
        let body = serde_json::to_value(&updates)
            .map_err(|e| ServiceError::Backend(format!("unserializable update: {e}")))?;
        Ok(self.patch_row(id, &body).await?)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), ServiceError> {
        let url = self.table_for_id(id)?;
        self.client.send(self.client.http().delete(url)).await?;
        Ok(())
    }

    async fn delete_bulk(&self, ids: &[ProductId]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.table_for_ids(ids)?;
        self.client.send(self.client.http().delete(url)).await?;
        Ok(())
    }

    async fn update_status_bulk(
        &self,
        ids: &[ProductId],
        status: ProductStatus,
    ) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.table_for_ids(ids)?;
        let request = self
            .client
            .http()
            .patch(url)
            .json(&json!({ "status": status }));
        self.client.send(request).await?;
        Ok(())
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError> {
        upload.validate()?;
        Ok(storage::upload(&self.client, &upload).await?)
    }

    async fn delete_image(&self, url: &str) -> Result<(), ServiceError> {
        Ok(storage::delete_by_url(&self.client, url).await?)
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        delta: i32,
        variant_name: Option<&str>,
    ) -> Result<(), ServiceError> {
        let product = self.get_by_id(id).await?;

        let body = if let Some(name) = variant_name {
            let mut variants = product.variants;
            let variant = variants
                .iter_mut()
                .find(|v| v.name == name)
                .ok_or_else(|| ServiceError::NotFound(format!("variant {name} of {id}")))?;
            variant.stock = Some(adjusted_stock(variant.stock, delta));
            json!({ "variants": variants })
        } else {
            json!({ "stock": adjusted_stock(product.stock, delta) })
        };

        self.patch_row(id, &body).await?;
        Ok(())
    }

    async fn increment_whatsapp_clicks(&self, id: &ProductId) -> Result<(), ServiceError> {
        let product = self.get_by_id(id).await?;
        let body = json!({ "whatsapp_clicks": product.whatsapp_clicks.saturating_add(1) });
        self.patch_row(id, &body).await?;
        Ok(())
    }
}

/// Apply a delta to an optional stock count, clamping at zero.
fn adjusted_stock(current: Option<u32>, delta: i32) -> u32 {
    let current = i64::from(current.unwrap_or(0));
    u32::try_from((current + i64::from(delta)).max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_clamps_at_zero() {
        assert_eq!(adjusted_stock(Some(3), -5), 0);
        assert_eq!(adjusted_stock(Some(3), -2), 1);
        assert_eq!(adjusted_stock(None, 4), 4);
        assert_eq!(adjusted_stock(None, -1), 0);
    }
}
