//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Base URL of the Supabase project
//! - `SUPABASE_ANON_KEY` - Public (anon) API key
//!
//! ## Optional
//! - `VARMINA_CART_PATH` - Path of the durable cart/preferences file
//!   (default: `varmina_store.json` in the working directory)
//! - `VARMINA_CATALOG_DEBOUNCE_MS` - Catalog refresh debounce window
//!   (default: 2000)
//! - `VARMINA_CATALOG_TIMEOUT_MS` - Catalog fetch deadline (default: 8000)
//! - `VARMINA_AUTH_TIMEOUT_MS` - Authorization lookup deadline
//!   (default: 15000)
//! - `VARMINA_TOAST_TTL_MS` - Toast display duration (default: 3000)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Supabase connection details.
    pub supabase: SupabaseConfig,
    /// Where the durable key/value file (cart, theme) lives.
    pub storage_path: PathBuf,
    /// Refresh calls inside this window are no-ops unless forced.
    pub catalog_debounce: Duration,
    /// Deadline for product/settings fetches.
    pub catalog_timeout: Duration,
    /// Deadline for the admin-role lookup. Deliberately generous: a false
    /// negative here locks an admin out.
    pub auth_timeout: Duration,
    /// How long a toast stays up before auto-expiry.
    pub toast_ttl: Duration,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: Url,
    /// Anon API key sent as `apikey` on every request.
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let supabase = SupabaseConfig::from_env()?;
        let storage_path =
            PathBuf::from(get_env_or_default("VARMINA_CART_PATH", "varmina_store.json"));

        Ok(Self {
            supabase,
            storage_path,
            catalog_debounce: get_duration_ms("VARMINA_CATALOG_DEBOUNCE_MS", 2000)?,
            catalog_timeout: get_duration_ms("VARMINA_CATALOG_TIMEOUT_MS", 8000)?,
            auth_timeout: get_duration_ms("VARMINA_AUTH_TIMEOUT_MS", 15_000)?,
            toast_ttl: get_duration_ms("VARMINA_TOAST_TTL_MS", 3000)?,
        })
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("SUPABASE_URL")?;
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_owned(), e.to_string()))?;
        let anon_key = SecretString::from(get_required_env("SUPABASE_ANON_KEY")?);
        Ok(Self { url, anon_key })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse a millisecond duration with a default value.
fn get_duration_ms(key: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duration_default_applies_when_unset() {
        let d = get_duration_ms("VARMINA_TEST_UNSET_DURATION", 1234).unwrap();
        assert_eq!(d, Duration::from_millis(1234));
    }

    #[test]
    fn supabase_debug_redacts_key() {
        let config = SupabaseConfig {
            url: Url::parse("https://example.supabase.co").unwrap(),
            anon_key: SecretString::from("a-very-secret-key"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("example.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("a-very-secret-key"));
    }
}
