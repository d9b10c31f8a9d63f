//! Deadline-bounded external calls.
//!
//! Every call that could hang (product fetch, settings fetch, role
//! lookup) is raced against a fixed deadline. The losing branch is
//! dropped, so an abandoned request can never mutate state after the
//! fallback committed; overlapping winners are additionally fenced with
//! a [`Generation`] counter.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Race `operation` against `deadline`.
///
/// Returns `None` on timeout; the abandoned operation is dropped, not
/// awaited further.
pub async fn with_timeout<T>(deadline: Duration, operation: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(deadline, operation).await.ok()
}

/// Race `operation` against `deadline`, substituting `fallback` on
/// timeout.
pub async fn with_timeout_or<T>(
    deadline: Duration,
    operation: impl Future<Output = T>,
    fallback: T,
) -> T {
    with_timeout(deadline, operation).await.unwrap_or(fallback)
}

/// Monotonic generation counter fencing overlapping async completions.
///
/// A writer claims a ticket before suspending and checks it is still the
/// newest before committing; a completion that lost the race is
/// discarded (last write wins).
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Claim the next ticket.
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is still the newest claim.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_operations() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            42
        };
        assert_eq!(with_timeout(Duration::from_secs(5), slow).await, None);
    }

    #[tokio::test]
    async fn passes_through_fast_operations() {
        let value = with_timeout_or(Duration::from_secs(5), async { 7 }, 0).await;
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_applies_on_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            true
        };
        assert!(!with_timeout_or(Duration::from_secs(1), slow, false).await);
    }

    #[test]
    fn generation_discards_stale_tickets() {
        let generation = Generation::new();
        let first = generation.begin();
        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
