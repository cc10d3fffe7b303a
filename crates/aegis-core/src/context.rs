//! The request-scoped security context.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Role, SessionId, TenantId, UserId};

/// The identity bundle attached to one logical call.
///
/// Created once at request entry by the session gate, bound to the call's
/// entire async execution tree by `aegis-context`, and discarded when the
/// call completes. Never persisted and never shared across unrelated calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Tenant every data operation in this call is confined to.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Role of the acting user within the tenant.
    pub role: Role,
    /// Session the call was authenticated under.
    pub session_id: SessionId,
    /// Client address, when known.
    pub ip_address: Option<String>,
}

impl SecurityContext {
    /// Create a context for an authenticated user request.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<TenantId>,
        user_id: impl Into<UserId>,
        role: Role,
        session_id: SessionId,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            role,
            session_id,
            ip_address: None,
        }
    }

    /// Attach the client address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Create a synthetic context for a declared system/background
    /// operation. System contexts are exempt from tenant scoping in the
    /// middleware; they are never produced by the gate.
    #[must_use]
    pub fn system(reason: impl Into<String>) -> Self {
        Self {
            tenant_id: TenantId::new("system"),
            user_id: UserId::new(format!("system:{}", reason.into())),
            role: Role::System,
            session_id: SessionId::generate(),
            ip_address: None,
        }
    }

    /// Whether this is a declared system scope rather than a user request.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

impl fmt::Display for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.user_id, self.tenant_id, self.role
        )
    }
}

impl From<TenantId> for SecurityContext {
    /// Minimal context used by tests and tooling; carries only the tenant.
    fn from(tenant_id: TenantId) -> Self {
        Self::new(tenant_id, UserId::new("unknown"), Role::Member, SessionId::generate())
    }
}
