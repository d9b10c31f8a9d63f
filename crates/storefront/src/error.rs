//! Unified error handling for the orchestration layer.
//!
//! Errors from explicit user actions (login, form submit) are returned to
//! the caller as `StoreError`; errors from background refreshes are
//! logged, converted into toasts, and never propagate.

use thiserror::Error;

use varmina_core::ProductValidationError;

use crate::services::ServiceError;

/// Application-level error type for the storefront stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ProductValidationError),

    /// An external service call failed. Timeouts never surface here:
    /// every deadline race falls back to a safe value instead of
    /// erroring (an indefinitely loading UI is worse than a stale one).
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// The signed-in identity is not an admin.
    #[error("Unauthorized")]
    Unauthorized,
}

impl StoreError {
    /// Generic user-facing message for this error.
    ///
    /// The original error is logged for diagnostics; end users only ever
    /// see these.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Service(ServiceError::InvalidCredentials) => {
                "Correo o contraseña incorrectos.".to_owned()
            }
            Self::Service(_) => "Ocurrió un error de conexión. Intente de nuevo.".to_owned(),
            Self::Unauthorized => "No tienes permisos de administrador.".to_owned(),
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
