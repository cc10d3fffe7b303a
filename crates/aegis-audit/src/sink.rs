//! The durable sink seam.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::event::AuditEvent;

/// Durable, append-only destination for audit events.
///
/// Implementations must be thread-safe. `bulk_insert` is all-or-nothing
/// from the logger's perspective: on error the whole batch is requeued.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a batch of events durably.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the batch could not be
    /// persisted; the logger will retry the same events later.
    async fn bulk_insert(&self, events: &[AuditEvent]) -> Result<(), String>;
}

/// In-memory sink for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn bulk_insert(&self, events: &[AuditEvent]) -> Result<(), String> {
        self.events
            .lock()
            .map_err(|e| format!("sink lock poisoned: {e}"))?
            .extend_from_slice(events);
        Ok(())
    }
}
