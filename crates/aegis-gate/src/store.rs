//! Session and organization lookups.
//!
//! Both stores are trait seams so the gate stays agnostic to where
//! sessions and organizations actually live. The in-memory
//! implementations back tests and local development.

use aegis_core::{Role, SessionId, TenantId, Timestamp, UserId};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// An authenticated session as stored by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// User the session belongs to.
    pub user_id: UserId,
    /// Organization the user signed in under.
    pub organization_id: TenantId,
    /// Role granted for this session.
    pub role: Role,
    /// When the session stops being valid.
    pub expires_at: Timestamp,
}

impl Session {
    /// Whether the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.0 <= Utc::now()
    }
}

/// An organization (tenant) record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier; doubles as the tenant id.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Soft-deletion marker. A deleted organization rejects all sessions.
    pub deleted_at: Option<Timestamp>,
    /// Billing state.
    pub subscription: SubscriptionStatus,
}

/// Billing state of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and current.
    Active,
    /// Evaluation period.
    Trial,
    /// Payment lapsed; access suspended until renewal.
    Lapsed,
}

impl SubscriptionStatus {
    /// Whether this state permits platform access.
    #[must_use]
    pub fn permits_access(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

/// Lookup of sessions by bearer token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a token to its session, if one exists. Expiry is the
    /// gate's concern, not the store's.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, String>;
}

/// Lookup of organizations by tenant id.
#[async_trait]
pub trait OrgStore: Send + Sync {
    /// Resolve an organization record.
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Organization>, String>;
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a token.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, token: impl Into<String>, session: Session) {
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .insert(token.into(), session);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, String> {
        Ok(self
            .sessions
            .lock()
            .expect("session store lock poisoned")
            .get(token)
            .cloned())
    }
}

/// In-memory organization store.
#[derive(Debug, Default)]
pub struct MemoryOrgStore {
    orgs: Mutex<HashMap<String, Organization>>,
}

impl MemoryOrgStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, org: Organization) {
        self.orgs
            .lock()
            .expect("org store lock poisoned")
            .insert(org.id.as_str().to_owned(), org);
    }
}

#[async_trait]
impl OrgStore for MemoryOrgStore {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Organization>, String> {
        Ok(self
            .orgs
            .lock()
            .expect("org store lock poisoned")
            .get(id.as_str())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        let expires_at = Utc::now()
            .checked_add_signed(expires_in)
            .expect("expiry in range");
        Session {
            id: SessionId::new("s1"),
            user_id: UserId::new("user_1"),
            organization_id: TenantId::new("org_A"),
            role: Role::Member,
            expires_at: Timestamp(expires_at),
        }
    }

    #[test]
    fn expiry_is_checked_against_now() {
        assert!(!session(Duration::hours(1)).is_expired());
        assert!(session(Duration::hours(-1)).is_expired());
    }

    #[test]
    fn lapsed_subscription_denies_access() {
        assert!(SubscriptionStatus::Active.permits_access());
        assert!(SubscriptionStatus::Trial.permits_access());
        assert!(!SubscriptionStatus::Lapsed.permits_access());
    }

    #[tokio::test]
    async fn memory_stores_round_trip() {
        let sessions = MemorySessionStore::new();
        sessions.insert("tok_1", session(Duration::hours(1)));
        assert!(sessions.find_by_token("tok_1").await.unwrap().is_some());
        assert!(sessions.find_by_token("tok_2").await.unwrap().is_none());

        let orgs = MemoryOrgStore::new();
        orgs.insert(Organization {
            id: TenantId::new("org_A"),
            name: "Acme".into(),
            deleted_at: None,
            subscription: SubscriptionStatus::Active,
        });
        assert!(orgs.find_by_id(&TenantId::new("org_A")).await.unwrap().is_some());
    }
}
