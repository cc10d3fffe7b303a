//! Context establishment.
//!
//! The gate is the only producer of user [`SecurityContext`]s. A claimed
//! bearer token walks the progression
//! `Unauthenticated → SessionValidated → OrgValidated → ContextEstablished`
//! and any failed step short-circuits to its own [`GateError`] variant, so
//! callers (and support staff reading audit trails) can tell an expired
//! session from a deleted organization from a lapsed subscription.

use std::sync::Arc;

use aegis_audit::{AuditAction, AuditEvent, AuditLogger};
use aegis_core::{RiskLevel, SecurityContext, TenantId, UserId};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{GateError, GateResult};
use crate::store::{OrgStore, Session, SessionStore};

/// Progression of one establishment attempt, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    SessionValidated,
    OrgValidated,
    ContextEstablished,
}

/// Turns claimed identity (a bearer token) into an established
/// [`SecurityContext`].
#[derive(Clone)]
pub struct Gate {
    sessions: Arc<dyn SessionStore>,
    orgs: Arc<dyn OrgStore>,
    audit: AuditLogger,
}

impl Gate {
    /// Assemble a gate over its stores.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>, orgs: Arc<dyn OrgStore>, audit: AuditLogger) -> Self {
        Self {
            sessions,
            orgs,
            audit,
        }
    }

    /// Validate a token and produce the context for the request.
    ///
    /// Emits a medium-risk audit event for every rejection and a low-risk
    /// one for every established scope.
    ///
    /// # Errors
    ///
    /// - [`GateError::InvalidSession`] for unknown or expired tokens.
    /// - [`GateError::OrganizationDeleted`] when the organization is gone.
    /// - [`GateError::SubscriptionLapsed`] when billing bars access.
    /// - [`GateError::Store`] when a backing store cannot answer.
    pub async fn establish(&self, token: &str) -> GateResult<SecurityContext> {
        let session = match self.load_session(token).await {
            Ok(session) => session,
            Err(err) => {
                self.audit_rejection(None, &err).await;
                return Err(err);
            }
        };
        debug!(session = %session.id, state = ?GateState::SessionValidated, "gate step");

        if let Err(err) = self.check_org(&session).await {
            self.audit_rejection(Some(&session), &err).await;
            return Err(err);
        }
        debug!(session = %session.id, state = ?GateState::OrgValidated, "gate step");

        let ctx = SecurityContext::new(
            session.organization_id.clone(),
            session.user_id.clone(),
            session.role,
            session.id.clone(),
        );
        debug!(
            context = %ctx,
            state = ?GateState::ContextEstablished,
            "gate step"
        );

        self.audit
            .log(AuditEvent::new(
                ctx.user_id.clone(),
                ctx.tenant_id.clone(),
                AuditAction::ScopeEstablished,
                "Session",
            ))
            .await;

        Ok(ctx)
    }

    /// Establish a context and run `fut` inside its scope.
    ///
    /// The scope lives exactly as long as `fut`: it is torn down on normal
    /// return, on error, and on cancellation.
    ///
    /// # Errors
    ///
    /// Same as [`establish`](Self::establish).
    pub async fn authorized<F>(&self, token: &str, fut: F) -> GateResult<F::Output>
    where
        F: Future,
    {
        let ctx = self.establish(token).await?;
        Ok(aegis_context::scope(ctx, fut).await)
    }

    async fn load_session(&self, token: &str) -> GateResult<Session> {
        let session = self
            .sessions
            .find_by_token(token)
            .await
            .map_err(GateError::store)?
            .ok_or(GateError::InvalidSession)?;
        if session.is_expired() {
            return Err(GateError::InvalidSession);
        }
        Ok(session)
    }

    async fn check_org(&self, session: &Session) -> GateResult<()> {
        let org = self
            .orgs
            .find_by_id(&session.organization_id)
            .await
            .map_err(GateError::store)?
            .ok_or(GateError::OrganizationDeleted)?;
        if org.deleted_at.is_some() {
            return Err(GateError::OrganizationDeleted);
        }
        if !org.subscription.permits_access() {
            return Err(GateError::SubscriptionLapsed);
        }
        Ok(())
    }

    async fn audit_rejection(&self, session: Option<&Session>, err: &GateError) {
        warn!(reason = err.label(), "session rejected at gate");
        let (actor, tenant) = session.map_or_else(
            || (UserId::new("unknown"), TenantId::new("unknown")),
            |s| (s.user_id.clone(), s.organization_id.clone()),
        );
        self.audit
            .log(
                AuditEvent::new(
                    actor,
                    tenant,
                    AuditAction::SessionRejected {
                        reason: err.label().to_owned(),
                    },
                    "Session",
                )
                .with_risk(RiskLevel::Medium)
                .with_details(json!({ "reason": err.label() })),
            )
            .await;
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate").finish_non_exhaustive()
    }
}
