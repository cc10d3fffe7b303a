//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The durable sink rejected a batch. The batch has been returned to
    /// the buffer; the flush will be retried.
    #[error("audit flush failed ({count} events requeued): {reason}")]
    FlushFailed {
        /// Why the sink rejected the batch.
        reason: String,
        /// How many events were requeued.
        count: usize,
    },
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
