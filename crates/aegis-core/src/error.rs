//! Shared security error taxonomy.

use thiserror::Error;

/// Errors raised by the isolation layer.
///
/// These always propagate (fail closed); no caller may substitute a default
/// that would widen tenant scope.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// A required piece of the security context is missing. Raised by the
    /// `require_*` accessors instead of ever defaulting to an unscoped
    /// state.
    #[error("security context unavailable: {what} is required but no scope is bound")]
    ContextUnavailable {
        /// Which piece was required (`tenant_id`, `user_id`, ...).
        what: &'static str,
    },

    /// A row from another tenant crossed the boundary. Only raised by the
    /// strict (non-production) post-read validation; this failing a build
    /// or test run is the point.
    #[error(
        "tenant isolation violation: {model}.{action} scoped to {expected} returned a row owned by {found}"
    )]
    TenantIsolationViolation {
        /// Entity type involved.
        model: String,
        /// Operation that leaked.
        action: String,
        /// Tenant the call was scoped to.
        expected: String,
        /// Tenant that owns the leaked row.
        found: String,
    },

    /// An entity type reached the middleware without a classification.
    /// Startup validation makes this unreachable in correctly configured
    /// deployments; at runtime the strict mode raises it loudly.
    #[error("unclassified model: {model} has no tenant-scope registration")]
    UnclassifiedModel {
        /// The unregistered entity type(s).
        model: String,
    },
}

/// Result alias for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
