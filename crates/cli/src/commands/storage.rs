//! Storage garbage collection.
//!
//! Collects every image filename referenced by product rows (including
//! variant image subsets), internal assets, and the brand settings, then
//! diffs that set against the full bucket listing and deletes the
//! orphans in small batches.
//!
//! Safety: when no referenced images are found but the catalog is not
//! empty, something is wrong (a failed fetch would wipe the bucket), so
//! the run aborts.

use std::collections::HashSet;

use varmina_storefront::config::StoreConfig;
use varmina_storefront::services::{AssetService, ProductService, SettingsService};
use varmina_storefront::supabase::{
    SupabaseAssets, SupabaseClient, SupabaseProducts, SupabaseSettings, storage,
};

/// Bucket listing page size.
const PAGE_SIZE: usize = 100;

/// Run the garbage collection.
///
/// # Errors
///
/// Returns configuration, listing, or deletion errors; per-batch delete
/// failures are logged and skipped like the rest of the run.
pub async fn gc(dry_run: bool, batch_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let client = SupabaseClient::new(&config.supabase)?;

    tracing::info!(bucket = storage::BUCKET, dry_run, "starting storage gc");

    let products = SupabaseProducts::new(client.clone()).get_all().await?;
    let referenced = referenced_names(&client, &products).await;
    tracing::info!(count = referenced.len(), "referenced images collected");

    if referenced.is_empty() && !products.is_empty() {
        return Err("no referenced images found but the catalog is not empty; aborting".into());
    }

    let bucket_files = list_all(&client).await?;
    tracing::info!(count = bucket_files.len(), "bucket objects listed");

    let orphans: Vec<String> = bucket_files
        .into_iter()
        .filter(|name| !name.starts_with('.') && !referenced.contains(name))
        .collect();

    if orphans.is_empty() {
        tracing::info!("no orphan files found, cleanup complete");
        return Ok(());
    }

    if dry_run {
        for name in &orphans {
            tracing::info!(object = %name, "orphan (dry run, not deleted)");
        }
        tracing::info!(count = orphans.len(), "dry run complete");
        return Ok(());
    }

    let batch_size = batch_size.max(1);
    let mut deleted = 0usize;
    for chunk in orphans.chunks(batch_size) {
        match storage::delete_objects(&client, chunk).await {
            Ok(()) => {
                deleted += chunk.len();
                tracing::info!(deleted, total = orphans.len(), "deleted batch");
            }
            Err(e) => tracing::error!(error = %e, "failed to delete batch, continuing"),
        }
    }

    tracing::info!(deleted, "cleanup complete");
    Ok(())
}

/// Every object name referenced by a row somewhere.
async fn referenced_names(
    client: &SupabaseClient,
    products: &[varmina_core::Product],
) -> HashSet<String> {
    let mut names = HashSet::new();

    for product in products {
        for url in &product.images {
            collect_name(url, &mut names);
        }
        for variant in &product.variants {
            for url in &variant.images {
                collect_name(url, &mut names);
            }
        }
    }

    // The assets table may not exist on older projects; a failed fetch
    // only loses asset references, never product ones.
    match SupabaseAssets::new(client.clone()).get_all().await {
        Ok(assets) => {
            for asset in &assets {
                for url in &asset.images {
                    collect_name(url, &mut names);
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not fetch internal assets, skipping"),
    }

    match SupabaseSettings::new(client.clone()).get_settings().await {
        Ok(Some(settings)) => {
            for url in [
                settings.logo_url.as_deref(),
                settings.hero_image_url.as_deref(),
                settings.hero_image_mobile_url.as_deref(),
            ]
            .into_iter()
            .flatten()
            {
                collect_name(url, &mut names);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not fetch brand settings, skipping"),
    }

    names
}

/// Record the bucket object name a row value refers to.
///
/// Accepts full public URLs (the service stores absolute URLs) and bare
/// object names (rows edited by hand); foreign URLs are ignored.
fn collect_name(value: &str, names: &mut HashSet<String>) {
    if let Some(name) = storage::object_name_from_url(value) {
        let decoded = urlencoding::decode(name).map_or_else(|_| name.to_owned(), |d| d.into_owned());
        names.insert(decoded);
    } else if !value.is_empty() && !value.starts_with("http") {
        names.insert(value.to_owned());
    }
}

/// Page through the whole bucket.
async fn list_all(client: &SupabaseClient) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut all = Vec::new();
    let mut offset = 0;
    loop {
        let page = storage::list_page(client, PAGE_SIZE, offset).await?;
        let page_len = page.len();
        all.extend(page.into_iter().map(|entry| entry.name));
        if page_len < PAGE_SIZE {
            break;
        }
        offset += page_len;
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_name_handles_urls_and_bare_names() {
        let mut names = HashSet::new();
        collect_name(
            "https://x.supabase.co/storage/v1/object/public/product-images/a%20b.jpg",
            &mut names,
        );
        collect_name("manual-upload.png", &mut names);
        collect_name("https://picsum.photos/id/1/800/800", &mut names);
        collect_name("", &mut names);

        assert!(names.contains("a b.jpg"));
        assert!(names.contains("manual-upload.png"));
        assert_eq!(names.len(), 2);
    }
}
