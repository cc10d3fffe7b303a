//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aegis_core::prelude::*;` to import all essential types.

pub use crate::context::SecurityContext;
pub use crate::error::{SecurityError, SecurityResult};
pub use crate::types::{RiskLevel, Role, SessionId, TenantId, Timestamp, UserId};
