//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aegis_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Event types
pub use crate::{AuditAction, AuditEvent, AuditOutcome};

// Logger
pub use crate::{AuditLogger, FlushPolicy};

// Sink
pub use crate::{AuditSink, MemorySink};

// Read-side aggregation
pub use crate::AuditSummary;
