use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Identifier of a submitted request.
///
/// Identifiers are handed out in submission order and double as the sort key
/// that restores input order after the engine finishes requests out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// # RequestCounter
///
/// Monotonic source of [`RequestId`]s. Values are never reused for the
/// lifetime of the counter, and the increment is atomic so one counter may be
/// shared between several orchestrators.
#[derive(Debug, Default)]
pub struct RequestCounter {
    next: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter whose first identifier is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Draws the next identifier.
    pub fn next_id(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// The identifier the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> RequestId {
        RequestId(self.next.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_sequential() {
        let counter = RequestCounter::new();
        assert_eq!(counter.next_id(), RequestId::new(0));
        assert_eq!(counter.next_id(), RequestId::new(1));
        assert_eq!(counter.peek(), RequestId::new(2));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let counter = RequestCounter::starting_at(7);
        assert_eq!(counter.peek(), RequestId::new(7));
        assert_eq!(counter.peek(), RequestId::new(7));
        assert_eq!(counter.next_id(), RequestId::new(7));
    }

    #[test]
    fn test_display_is_decimal() {
        assert_eq!(RequestId::new(42).to_string(), "42");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_counter_never_repeats() {
        let counter = Arc::new(RequestCounter::new());
        let mut handles = vec![];
        for _ in 0..4 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                (0..250).map(|_| counter.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "identifier {id} handed out twice");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
