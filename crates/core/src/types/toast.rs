//! Transient notification messages.

use serde::{Deserialize, Serialize};

/// Opaque toast identifier, random per message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(String);

impl ToastId {
    /// Wrap a generated identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A transient, auto-expiring notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
}
