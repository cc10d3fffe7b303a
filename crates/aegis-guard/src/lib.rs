//! Aegis Guard - tenant isolation middleware.
//!
//! Intercepts every operation headed for the data-access layer and
//! guarantees it is confined to the calling tenant:
//!
//! - Read-like operations get the tenant predicate AND-merged into their
//!   filter — a caller-supplied filter naming another tenant still narrows
//!   to the caller's own rows.
//! - Creates get the tenant id injected (overwriting any spoofed value).
//! - Mutations get the predicate merged into their match filter, so a
//!   foreign target affects zero rows and reports not-found.
//! - Fields registered as sensitive are encrypted on the way in and
//!   decrypted (or masked, for read-only roles) on the way out.
//! - Mutations on tenant-scoped models emit audit events.
//!
//! The middleware is implemented purely against the [`DataSource`] hook
//! and is agnostic to the underlying storage engine.
//!
//! # Defense in depth
//!
//! Under [`Enforcement::Strict`] (non-production) every returned row is
//! re-checked against the scoped tenant; a mismatch raises
//! `SecurityError::TenantIsolationViolation`, turning a middleware bug
//! into an immediate loud failure instead of silent leakage.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod client;
mod error;
mod middleware;
mod operation;
mod registry;

pub use client::{DataSource, GuardedClient};
pub use error::{GuardError, GuardResult};
pub use middleware::{Enforcement, ScopeDecision, TenantGuard, TENANT_FIELD};
pub use operation::{DataAction, DataOperation, OperationArgs, QueryResult};
pub use registry::{ModelEntry, ModelRegistry, ModelRegistryBuilder, ModelScope};
