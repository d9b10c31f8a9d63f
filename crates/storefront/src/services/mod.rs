//! External-service contracts consumed by the orchestration layer.
//!
//! The stores never talk to a concrete backend; they hold `Arc<dyn …>`
//! handles to these traits, injected at construction. The Supabase-backed
//! implementations live in [`crate::supabase`]; the integration-tests
//! crate provides in-memory fakes.

pub mod kv;

pub use kv::{JsonFileStorage, KeyValueStorage, MemoryStorage};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::broadcast;

use varmina_core::{
    AssetId, AssetInput, BrandSettings, CreateProductInput, ImageUpload, InternalAsset, Product,
    ProductId, ProductStatus, ProductValidationError, UpdateProductInput, UserId,
};

/// Errors surfaced by service implementations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before the network call was made.
    #[error("validation error: {0}")]
    Validation(#[from] ProductValidationError),

    /// The backend rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport or backend failure; the message is for logs, never for
    /// end users.
    #[error("backend error: {0}")]
    Backend(String),
}

/// An authenticated backend session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
    pub access_token: SecretString,
}

/// Auth lifecycle events, mirroring the identity provider's callback tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Fired once when the provider restores (or fails to restore) the
    /// persisted session at startup.
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Payload delivered to auth-state subscribers.
pub type AuthChange = (AuthEvent, Option<Session>);

/// Identity/session service (sign-in, sign-out, state changes).
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// The current session, if any.
    async fn current_session(&self) -> Result<Option<Session>, ServiceError>;

    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ServiceError>;

    /// Invalidate the current session remotely.
    async fn sign_out(&self) -> Result<(), ServiceError>;

    /// Subscribe to auth-state changes (sign-in/out, token refresh).
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Authorization lookup: is this user an admin?
///
/// Absence of a matching role row implies `false`; transport errors are
/// returned so the caller can apply its own fail-closed policy.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn is_admin(&self, user_id: &UserId) -> Result<bool, ServiceError>;
}

/// Product catalog service.
///
/// All mutating operations validate their input before any network call
/// and return descriptive errors on violation.
#[async_trait]
pub trait ProductService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Product>, ServiceError>;

    async fn create(&self, input: CreateProductInput) -> Result<Product, ServiceError>;

    async fn update(
        &self,
        id: &ProductId,
        updates: UpdateProductInput,
    ) -> Result<Product, ServiceError>;

    async fn delete(&self, id: &ProductId) -> Result<(), ServiceError>;

    async fn delete_bulk(&self, ids: &[ProductId]) -> Result<(), ServiceError>;

    async fn update_status_bulk(
        &self,
        ids: &[ProductId],
        status: ProductStatus,
    ) -> Result<(), ServiceError>;

    /// Upload an image and return its public URL.
    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError>;

    /// Delete an uploaded image by its public URL. URLs outside the
    /// product bucket are ignored.
    async fn delete_image(&self, url: &str) -> Result<(), ServiceError>;

    /// Adjust stock by `delta` for the product or one of its variants.
    /// Stock clamps at zero.
    async fn update_stock(
        &self,
        id: &ProductId,
        delta: i32,
        variant_name: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Bump the WhatsApp consultation counter.
    async fn increment_whatsapp_clicks(&self, id: &ProductId) -> Result<(), ServiceError>;
}

/// Internal back-office assets (supplies, packaging, tools).
#[async_trait]
pub trait AssetService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<InternalAsset>, ServiceError>;

    async fn create(&self, input: AssetInput) -> Result<InternalAsset, ServiceError>;

    async fn update(&self, id: &AssetId, input: AssetInput) -> Result<InternalAsset, ServiceError>;

    async fn delete(&self, id: &AssetId) -> Result<(), ServiceError>;
}

/// Brand-settings singleton read.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// `Ok(None)` means "no settings row exists"; callers keep whatever
    /// they had cached.
    async fn get_settings(&self) -> Result<Option<BrandSettings>, ServiceError>;
}
