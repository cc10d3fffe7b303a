//! Canned contexts, sessions, and organizations.

use aegis_core::{Role, SecurityContext, SessionId, TenantId, Timestamp, UserId};
use aegis_gate::{Organization, Session, SubscriptionStatus};
use chrono::Utc;

/// A member-role context for `tenant`.
#[must_use]
pub fn member_ctx(tenant: &str) -> SecurityContext {
    ctx_with_role(tenant, Role::Member)
}

/// An admin-role context for `tenant`.
#[must_use]
pub fn admin_ctx(tenant: &str) -> SecurityContext {
    ctx_with_role(tenant, Role::Admin)
}

/// A read-only context for `tenant`; sensitive fields come back masked.
#[must_use]
pub fn read_only_ctx(tenant: &str) -> SecurityContext {
    ctx_with_role(tenant, Role::ReadOnly)
}

fn ctx_with_role(tenant: &str, role: Role) -> SecurityContext {
    SecurityContext::new(
        tenant,
        UserId::new(format!("user_{tenant}")),
        role,
        SessionId::generate(),
    )
}

/// A session for `user` under `org`, expiring in one hour.
///
/// # Panics
///
/// Panics if the system clock is at the edge of the representable range.
#[must_use]
pub fn active_session(user: &str, org: &str, role: Role) -> Session {
    let expires_at = Utc::now()
        .checked_add_signed(chrono::Duration::hours(1))
        .expect("expiry in range");
    Session {
        id: SessionId::generate(),
        user_id: UserId::new(user),
        organization_id: TenantId::new(org),
        role,
        expires_at: Timestamp(expires_at),
    }
}

/// A live organization with an active subscription.
#[must_use]
pub fn active_org(id: &str) -> Organization {
    Organization {
        id: TenantId::new(id),
        name: format!("{id} Inc."),
        deleted_at: None,
        subscription: SubscriptionStatus::Active,
    }
}
