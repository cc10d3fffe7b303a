//! The buffered audit logger.

use aegis_core::{RiskLevel, TenantId, UserId};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::{AuditAction, AuditEvent};
use crate::sink::AuditSink;

/// When and how aggressively the buffer is flushed.
#[derive(Debug, Clone)]
pub struct FlushPolicy {
    /// Timer-driven flush interval.
    pub flush_interval: Duration,
    /// Maximum buffered events before low-risk eviction kicks in.
    pub buffer_cap: usize,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(30),
            buffer_cap: 1000,
        }
    }
}

/// Buffered, append-only audit logger.
///
/// Many requests append concurrently; the buffer is the only shared
/// mutable state and is guarded by an async mutex. Flushes are FIFO per
/// buffer. Cheap to clone; clones share one buffer.
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Inner>,
}

struct Inner {
    buffer: Mutex<VecDeque<AuditEvent>>,
    policy: FlushPolicy,
    sink: Arc<dyn AuditSink>,
    flusher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl AuditLogger {
    /// Create a logger over a durable sink. No background work starts
    /// until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, policy: FlushPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                buffer: Mutex::new(VecDeque::new()),
                policy,
                sink,
                flusher: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Start the periodic flusher. Must be called from within a tokio
    /// runtime. Calling twice replaces the previous task.
    pub fn start(&self) {
        let logger = self.clone();
        let interval = self.inner.policy.flush_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = logger.flush().await {
                    warn!(error = %e, "periodic audit flush failed; will retry");
                }
            }
        });
        if let Ok(mut slot) = self.inner.flusher.lock() {
            if let Some(old) = slot.replace(handle) {
                old.abort();
            }
        }
    }

    /// Append an event to the buffer.
    ///
    /// High/critical-risk events trigger an immediate flush; a failed
    /// immediate flush keeps the events buffered for the next retry rather
    /// than surfacing to the caller — audit logging never fails the
    /// operation it records.
    pub async fn log(&self, event: AuditEvent) {
        let urgent = event.risk.is_urgent();
        {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.push_back(event);
            self.enforce_cap(&mut buffer);
        }
        if urgent {
            if let Err(e) = self.flush().await {
                warn!(error = %e, "immediate flush failed; events retained for retry");
            }
        }
    }

    /// Drain the buffer into the sink.
    ///
    /// FIFO: events reach the sink in append order. On sink failure the
    /// whole batch is returned to the front of the buffer, order
    /// preserved, and the error is reported.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::FlushFailed`] when the sink rejects the
    /// batch; no events are lost.
    pub async fn flush(&self) -> AuditResult<()> {
        let batch: Vec<AuditEvent> = {
            let mut buffer = self.inner.buffer.lock().await;
            if buffer.is_empty() {
                return Ok(());
            }
            buffer.drain(..).collect()
        };

        match self.inner.sink.bulk_insert(&batch).await {
            Ok(()) => {
                debug!(count = batch.len(), "audit events flushed");
                Ok(())
            },
            Err(reason) => {
                let count = batch.len();
                let mut buffer = self.inner.buffer.lock().await;
                for event in batch.into_iter().rev() {
                    buffer.push_front(event);
                }
                Err(AuditError::FlushFailed { reason, count })
            },
        }
    }

    /// Stop the periodic flusher and perform a final flush.
    ///
    /// A failed final flush is retried once; after that the failure is
    /// logged and remaining events stay in memory (the process is exiting).
    pub async fn shutdown(&self) {
        if let Ok(mut slot) = self.inner.flusher.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        if self.flush().await.is_err() {
            if let Err(e) = self.flush().await {
                error!(error = %e, "final audit flush failed on shutdown");
            }
        }
    }

    /// Number of events currently buffered.
    pub async fn pending(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }

    /// Evict oldest low-risk events past the cap; record the loss.
    ///
    /// High/critical events are never evicted — if the buffer is full of
    /// them the cap is allowed to overshoot until a flush succeeds.
    fn enforce_cap(&self, buffer: &mut VecDeque<AuditEvent>) {
        let cap = self.inner.policy.buffer_cap;
        if buffer.len() <= cap {
            return;
        }

        let mut dropped: usize = 0;
        while buffer.len() > cap {
            let Some(pos) = buffer.iter().position(|e| !e.risk.is_urgent()) else {
                break;
            };
            buffer.remove(pos);
            dropped = dropped.saturating_add(1);
        }

        if dropped > 0 {
            error!(dropped, cap, "audit buffer cap exceeded; oldest low-risk events dropped");
            buffer.push_back(
                AuditEvent::new(
                    UserId::new("system:audit"),
                    TenantId::new("system"),
                    AuditAction::EventsDropped { count: dropped },
                    "AuditBuffer",
                )
                .with_risk(RiskLevel::Critical),
            );
        }
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that fails the first `n` inserts, then delegates.
    struct FlakySink {
        remaining_failures: AtomicUsize,
        inner: MemorySink,
    }

    impl FlakySink {
        fn failing(n: usize) -> Self {
            Self {
                remaining_failures: AtomicUsize::new(n),
                inner: MemorySink::new(),
            }
        }
    }

    #[async_trait]
    impl AuditSink for FlakySink {
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

    fn event(risk: RiskLevel) -> AuditEvent {
        AuditEvent::new(
            UserId::new("u1"),
            TenantId::new("org_A"),
            AuditAction::RecordCreated,
            "Client",
        )
        .with_risk(risk)
    }

    #[tokio::test]
    async fn flush_drains_in_fifo_order() {
        let sink = Arc::new(MemorySink::new());
        let logger = AuditLogger::new(sink.clone(), FlushPolicy::default());

        for i in 0..3 {
            logger
                .log(event(RiskLevel::Low).with_resource_id(format!("r{i}")))
                .await;
        }
        logger.flush().await.unwrap();

        let flushed = sink.events();
        assert_eq!(flushed.len(), 3);
        assert_eq!(flushed[0].resource_id.as_deref(), Some("r0"));
        assert_eq!(flushed[2].resource_id.as_deref(), Some("r2"));
        assert_eq!(logger.pending().await, 0);
    }

    #[tokio::test]
    async fn failed_flush_requeues_everything() {
        let sink = Arc::new(FlakySink::failing(1));
        let logger = AuditLogger::new(sink.clone(), FlushPolicy::default());

        logger.log(event(RiskLevel::Low)).await;
        logger.log(event(RiskLevel::Medium)).await;

        let err = logger.flush().await.unwrap_err();
        assert!(matches!(err, AuditError::FlushFailed { count: 2, .. }));
        assert_eq!(logger.pending().await, 2);
        assert!(sink.inner.events().is_empty());

        // Next flush succeeds with the same events.
        logger.flush().await.unwrap();
        assert_eq!(sink.inner.events().len(), 2);
        assert_eq!(logger.pending().await, 0);
    }

    #[tokio::test]
    async fn urgent_events_flush_immediately() {
        let sink = Arc::new(MemorySink::new());
        let logger = AuditLogger::new(sink.clone(), FlushPolicy::default());

        logger.log(event(RiskLevel::Low)).await;
        assert!(sink.events().is_empty());

        logger.log(event(RiskLevel::High)).await;
        // The high-risk event drags the buffered low-risk one with it.
        assert_eq!(sink.events().len(), 2);
    }

    #[tokio::test]
    async fn cap_drops_oldest_low_risk_and_records_it() {
        let sink = Arc::new(MemorySink::new());
        let logger = AuditLogger::new(
            sink.clone(),
            FlushPolicy {
                flush_interval: Duration::from_secs(3600),
                buffer_cap: 3,
            },
        );

        logger.log(event(RiskLevel::Low).with_resource_id("old")).await;
        logger.log(event(RiskLevel::Medium)).await;
        logger.log(event(RiskLevel::Medium)).await;
        logger.log(event(RiskLevel::Medium)).await;

        logger.flush().await.unwrap();
        let flushed = sink.events();

        // Oldest low-risk event is gone, replaced by a critical meta-event.
        assert!(flushed.iter().all(|e| e.resource_id.as_deref() != Some("old")));
        let meta = flushed
            .iter()
            .find(|e| matches!(e.action, AuditAction::EventsDropped { .. }))
            .expect("drop meta-event");
        assert_eq!(meta.risk, RiskLevel::Critical);
    }

    #[tokio::test]
    async fn urgent_events_are_never_evicted() {
        // Cap of 1, and an urgent event already buffered by a failing sink.
        let sink = Arc::new(FlakySink::failing(usize::MAX));
        let logger = AuditLogger::new(
            sink,
            FlushPolicy {
                flush_interval: Duration::from_secs(3600),
                buffer_cap: 1,
            },
        );

        logger.log(event(RiskLevel::Critical)).await;
        logger.log(event(RiskLevel::Critical)).await;

        // Both survive: nothing low-risk to evict.
        assert_eq!(logger.pending().await, 2);
    }

    #[tokio::test]
    async fn periodic_flusher_drains_buffer() {
        tokio::time::pause();
        let sink = Arc::new(MemorySink::new());
        let logger = AuditLogger::new(
            sink.clone(),
            FlushPolicy {
                flush_interval: Duration::from_millis(100),
                buffer_cap: 1000,
            },
        );
        logger.start();
        // Let the spawned flusher task run far enough to create its
        // interval before the mock clock is advanced.
        tokio::task::yield_now().await;

        logger.log(event(RiskLevel::Low)).await;
        tokio::time::advance(Duration::from_millis(150)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(sink.events().len(), 1);
        logger.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_flushes_remaining() {
        let sink = Arc::new(MemorySink::new());
        let logger = AuditLogger::new(sink.clone(), FlushPolicy::default());

        logger.log(event(RiskLevel::Low)).await;
        logger.shutdown().await;

        assert_eq!(sink.events().len(), 1);
    }
}
