//! Image bucket operations.
//!
//! Uploads get a fresh UUID object name (originals often collide or
//! carry unsafe characters) and come back as the public-CDN URL stored
//! on the product row. Deletion accepts that public URL and works
//! backwards to the object path; URLs outside the bucket are ignored,
//! matching how rows reference external imagery during migrations.

use serde::{Deserialize, Serialize};

use varmina_core::ImageUpload;

use super::{SupabaseClient, SupabaseError};

/// The one bucket all storefront imagery lives in.
pub const BUCKET: &str = "product-images";

/// Marker that a public URL belongs to our bucket.
const BUCKET_MARKER: &str = "/product-images/";

/// Upload an image and return its public URL.
///
/// # Errors
///
/// Returns the transport or API error from the storage endpoint.
pub async fn upload(client: &SupabaseClient, upload: &ImageUpload) -> Result<String, SupabaseError> {
    let object_name = upload.extension().map_or_else(
        || uuid::Uuid::new_v4().to_string(),
        |ext| format!("{}.{ext}", uuid::Uuid::new_v4()),
    );

    let url = client.endpoint(&format!("storage/v1/object/{BUCKET}/{object_name}"))?;
    let request = client
        .http()
        .post(url)
        .header("Content-Type", upload.content_type.clone())
        .header("Cache-Control", "max-age=3600")
        .header("x-upsert", "false")
        .body(upload.bytes.clone());
    client.send(request).await?;

    let public = client.endpoint(&format!("storage/v1/object/public/{BUCKET}/{object_name}"))?;
    Ok(public.to_string())
}

/// Delete an object by its public URL. URLs outside the bucket are a
/// no-op.
///
/// # Errors
///
/// Returns the transport or API error from the storage endpoint.
pub async fn delete_by_url(client: &SupabaseClient, url: &str) -> Result<(), SupabaseError> {
    let Some(object_name) = object_name_from_url(url) else {
        return Ok(());
    };
    let endpoint = client.endpoint(&format!("storage/v1/object/{BUCKET}/{object_name}"))?;
    client.send(client.http().delete(endpoint)).await?;
    Ok(())
}

/// One page of a bucket listing.
#[derive(Debug, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
}

/// List one page of bucket objects.
///
/// # Errors
///
/// Returns the transport or API error from the storage endpoint.
pub async fn list_page(
    client: &SupabaseClient,
    limit: usize,
    offset: usize,
) -> Result<Vec<ObjectEntry>, SupabaseError> {
    let url = client.endpoint(&format!("storage/v1/object/list/{BUCKET}"))?;
    let request = client.http().post(url).json(&ListRequest {
        prefix: "",
        limit,
        offset,
    });
    client
        .send(request)
        .await?
        .json()
        .await
        .map_err(|e| SupabaseError::Parse(e.to_string()))
}

/// Delete several objects in one call.
///
/// # Errors
///
/// Returns the transport or API error from the storage endpoint.
pub async fn delete_objects(
    client: &SupabaseClient,
    object_names: &[String],
) -> Result<(), SupabaseError> {
    if object_names.is_empty() {
        return Ok(());
    }
    let url = client.endpoint(&format!("storage/v1/object/{BUCKET}"))?;
    let request = client
        .http()
        .delete(url)
        .json(&serde_json::json!({ "prefixes": object_names }));
    client.send(request).await?;
    Ok(())
}

/// Extract the bucket object name from a public URL.
///
/// Returns `None` for URLs that do not point into the bucket.
#[must_use]
pub fn object_name_from_url(url: &str) -> Option<&str> {
    let (_, name) = url.split_once(BUCKET_MARKER)?;
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn object_name_parses_public_urls() {
        let url =
            "https://x.supabase.co/storage/v1/object/public/product-images/abc-123.jpg";
        assert_eq!(object_name_from_url(url).unwrap(), "abc-123.jpg");
    }

    #[test]
    fn foreign_urls_are_ignored() {
        assert!(object_name_from_url("https://picsum.photos/id/1/800/800").is_none());
        assert!(object_name_from_url("https://x.supabase.co/storage/v1/object/public/product-images/").is_none());
    }
}
