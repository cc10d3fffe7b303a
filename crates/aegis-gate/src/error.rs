//! Gate error types.
//!
//! The three authorization failures are distinct variants with distinct
//! messages. Messages name the failure class only; they never echo tokens,
//! session contents, or store internals back to the caller.

use thiserror::Error;

/// Errors raised while establishing a security context.
#[derive(Debug, Error)]
pub enum GateError {
    /// The session token is unknown, malformed, or expired.
    #[error("session is invalid or expired")]
    InvalidSession,

    /// The session's organization has been deleted.
    #[error("organization has been deleted")]
    OrganizationDeleted,

    /// The organization exists but its subscription has lapsed.
    #[error("organization subscription has lapsed")]
    SubscriptionLapsed,

    /// A backing store failed; authorization could not be decided.
    #[error("authorization store unavailable")]
    Store(#[source] StoreUnavailable),
}

/// Carrier for the underlying store failure. Kept out of the display
/// string so store internals never reach response bodies; available via
/// `source()` for logs.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreUnavailable(pub String);

impl GateError {
    /// Wrap a raw store failure.
    #[must_use]
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store(StoreUnavailable(reason.into()))
    }

    /// Stable label for audit details and metrics keys.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidSession => "invalid_session",
            Self::OrganizationDeleted => "organization_deleted",
            Self::SubscriptionLapsed => "subscription_lapsed",
            Self::Store(_) => "store_unavailable",
        }
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
