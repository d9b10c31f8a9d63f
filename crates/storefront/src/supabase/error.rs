//! Supabase client errors.

use thiserror::Error;

use crate::services::ServiceError;

/// Errors that can occur when talking to the Supabase project.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested row does not exist.
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// Client-side configuration problem.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<SupabaseError> for ServiceError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::RowNotFound(what) => Self::NotFound(what),
            other => Self::Backend(other.to_string()),
        }
    }
}
