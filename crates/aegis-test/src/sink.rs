//! A failure-injecting [`AuditSink`].

use aegis_audit::{AuditEvent, AuditSink, MemorySink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Sink that rejects the first `n` inserts, then delegates to an inner
/// [`MemorySink`]. For exercising flush retry and requeue behavior.
#[derive(Debug)]
pub struct FlakyAuditSink {
    remaining_failures: AtomicUsize,
    inner: MemorySink,
}

impl FlakyAuditSink {
    /// A sink whose first `n` inserts fail.
    #[must_use]
    pub fn failing(n: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(n),
            inner: MemorySink::new(),
        }
    }

    /// Events that made it through.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.events()
    }
}

#[async_trait]
impl AuditSink for FlakyAuditSink {
    async fn bulk_insert(&self, events: &[AuditEvent]) -> Result<(), String> {
        let prev = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev > 0 {
            return Err("sink unavailable".to_string());
        }
        self.inner.bulk_insert(events).await
    }
}
