//! Transient notification queue.
//!
//! Any store can push a toast; a renderer elsewhere consumes the
//! snapshot. Entries keep insertion order, are never deduplicated, and
//! expire automatically after a fixed display duration. Removal is
//! idempotent because the expiry timer and a manual dismissal may race
//! for the same entry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::distr::{Alphanumeric, SampleString};

use varmina_core::{ToastId, ToastKind, ToastMessage};

/// Default display duration before auto-expiry.
const DEFAULT_TTL: Duration = Duration::from_secs(3);

/// Length of generated toast identifiers.
const ID_LEN: usize = 9;

/// FIFO queue of transient messages.
///
/// Cheaply cloneable; all clones share the same queue. `push` must be
/// called from within a tokio runtime (it spawns the expiry timer).
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<ToastInner>,
}

struct ToastInner {
    toasts: Mutex<Vec<ToastMessage>>,
    ttl: Duration,
}

impl ToastQueue {
    /// Create a queue with the default display duration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a queue with a custom display duration.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(ToastInner {
                toasts: Mutex::new(Vec::new()),
                ttl,
            }),
        }
    }

    /// Append a message and schedule its auto-expiry.
    pub fn push(&self, kind: ToastKind, message: impl Into<String>) -> ToastId {
        let id = ToastId::new(
            Alphanumeric
                .sample_string(&mut rand::rng(), ID_LEN)
                .to_lowercase(),
        );
        {
            let mut toasts = self.inner.toasts.lock().unwrap_or_else(|e| e.into_inner());
            toasts.push(ToastMessage {
                id: id.clone(),
                kind,
                message: message.into(),
            });
        }

        let queue = self.clone();
        let expired = id.clone();
        let ttl = self.inner.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            queue.dismiss(&expired);
        });

        id
    }

    /// Convenience wrappers matching the three severities.
    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Info, message)
    }

    /// Remove a toast. Removing an already-removed id is a no-op.
    pub fn dismiss(&self, id: &ToastId) {
        let mut toasts = self.inner.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.retain(|t| &t.id != id);
    }

    /// Current messages in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ToastMessage> {
        self.inner
            .toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of live messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}
