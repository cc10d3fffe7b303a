//! Aegis Core - Foundation types for the Aegis multi-tenant security layer.
//!
//! This crate provides:
//! - Identifier newtypes (`TenantId`, `UserId`, `SessionId`)
//! - The request-scoped [`SecurityContext`] bundle
//! - Role and risk-level classifications
//! - The shared [`SecurityError`] taxonomy for isolation failures
//!
//! Everything here is deliberately dependency-light: the enforcement crates
//! (`aegis-guard`, `aegis-gate`) and the service crates (`aegis-crypto`,
//! `aegis-audit`) all build on these types.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod context;
pub mod error;
pub mod types;

pub use context::SecurityContext;
pub use error::{SecurityError, SecurityResult};
pub use types::{RiskLevel, Role, SessionId, TenantId, Timestamp, UserId};
