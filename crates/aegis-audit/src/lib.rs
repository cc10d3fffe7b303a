//! Aegis Audit - buffered, durable, append-only security audit logging.
//!
//! This crate provides:
//! - [`AuditEvent`]: immutable records of security-relevant operations
//! - [`AuditLogger`]: a bounded in-memory buffer flushed to a durable sink
//!   on a timer, immediately for high/critical risk, and on shutdown
//! - [`AuditSink`]: the seam to the durable store (`bulk_insert`)
//! - [`AuditSummary`]: eventually-consistent read-side aggregation for
//!   compliance dashboards
//!
//! # Durability Model
//!
//! Events are never silently dropped. A failed flush returns the batch to
//! the front of the buffer for retry. The buffer is bounded; beyond the cap
//! only the oldest low-risk events are evicted, and the eviction itself is
//! recorded as a critical meta-event.
//!
//! # Example
//!
//! ```
//! use aegis_audit::{AuditAction, AuditEvent, AuditLogger, FlushPolicy, MemorySink};
//! use aegis_core::{RiskLevel, TenantId, UserId};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sink = Arc::new(MemorySink::new());
//! let logger = AuditLogger::new(sink.clone(), FlushPolicy::default());
//!
//! logger
//!     .log(AuditEvent::new(
//!         UserId::new("user_1"),
//!         TenantId::new("org_A"),
//!         AuditAction::RecordCreated,
//!         "Client",
//!     ))
//!     .await;
//!
//! logger.flush().await.unwrap();
//! assert_eq!(sink.events().len(), 1);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod event;
mod logger;
mod sink;
mod summary;

pub use error::{AuditError, AuditResult};
pub use event::{AuditAction, AuditEvent, AuditOutcome};
pub use logger::{AuditLogger, FlushPolicy};
pub use sink::{AuditSink, MemorySink};
pub use summary::AuditSummary;
