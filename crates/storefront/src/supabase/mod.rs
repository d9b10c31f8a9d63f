//! Supabase-backed implementations of the service contracts.
//!
//! Three REST surfaces of the same project are consumed here: PostgREST
//! (`/rest/v1`) for rows, GoTrue (`/auth/v1`) for identity, and Storage
//! (`/storage/v1`) for the image bucket. Every request carries the anon
//! `apikey`; an `Authorization` bearer is added once a user signs in so
//! row-level security sees the real identity.

mod error;
mod rows;

pub mod assets;
pub mod auth;
pub mod products;
pub mod settings;
pub mod storage;

pub use assets::SupabaseAssets;
pub use auth::{SupabaseAuth, SupabaseAuthorization};
pub use error::SupabaseError;
pub use products::SupabaseProducts;
pub use settings::SupabaseSettings;

use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::SupabaseConfig;

/// Shared REST client for one Supabase project.
///
/// Cheaply cloneable; all service implementations hold a clone so a
/// sign-in propagates its bearer token to every surface at once.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base: Url,
    anon_key: SecretString,
    bearer: RwLock<Option<SecretString>>,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error if the anon key is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| SupabaseError::Config(format!("invalid anon key: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base: config.url.clone(),
                anon_key: config.anon_key.clone(),
                bearer: RwLock::new(None),
            }),
        })
    }

    /// Absolute URL for an API path like `rest/v1/products`.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.inner
            .base
            .join(path)
            .map_err(|e| SupabaseError::Config(format!("bad endpoint {path}: {e}")))
    }

    /// Install (or clear) the signed-in user's bearer token.
    pub(crate) fn set_bearer(&self, token: Option<SecretString>) {
        if let Ok(mut guard) = self.inner.bearer.write() {
            *guard = token;
        }
    }

    /// The token to authorize with: the user's, or the anon key.
    fn bearer(&self) -> SecretString {
        self.inner
            .bearer
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_else(|| self.inner.anon_key.clone())
    }

    /// Attach authorization and execute, mapping non-success statuses to
    /// [`SupabaseError::Api`].
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, SupabaseError> {
        let response = request
            .bearer_auth(self.bearer().expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(
                status = status.as_u16(),
                body = %message.chars().take(300).collect::<String>(),
                "supabase request failed"
            );
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// GET helper returning deserialized JSON.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, SupabaseError> {
        let response = self.send(self.http().get(url)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
