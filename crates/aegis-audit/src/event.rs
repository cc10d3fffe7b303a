//! Audit event types.
//!
//! Every security-relevant operation is recorded as an event. Events are
//! append-only: once created they are never mutated, only buffered and
//! flushed.

use aegis_core::{RiskLevel, TenantId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event was created (at the point of the operation, not at
    /// flush time).
    pub timestamp: Timestamp,
    /// The acting user.
    pub actor_user_id: UserId,
    /// Tenant the operation was scoped to.
    pub tenant_id: TenantId,
    /// What happened.
    pub action: AuditAction,
    /// Entity type the operation targeted.
    pub resource_type: String,
    /// Specific resource, when one is identifiable.
    pub resource_id: Option<String>,
    /// Whether the operation succeeded.
    pub outcome: AuditOutcome,
    /// Risk classification; high/critical events flush immediately.
    pub risk: RiskLevel,
    /// Free-form structured context.
    pub details: serde_json::Value,
}

impl AuditEvent {
    /// Create a low-risk successful event; adjust with the builder methods.
    #[must_use]
    pub fn new(
        actor_user_id: UserId,
        tenant_id: TenantId,
        action: AuditAction,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Timestamp::now(),
            actor_user_id,
            tenant_id,
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            outcome: AuditOutcome::success(),
            risk: RiskLevel::Low,
            details: serde_json::Value::Null,
        }
    }

    /// Attach the specific resource id.
    #[must_use]
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Set the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Set the risk level.
    #[must_use]
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Actions that can be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    /// A tenant-scoped record was created.
    RecordCreated,
    /// A tenant-scoped record (or batch) was updated.
    RecordUpdated,
    /// A tenant-scoped record (or batch) was deleted.
    RecordDeleted,
    /// A record was upserted.
    RecordUpserted,
    /// A context scope was established for a validated session.
    ScopeEstablished,
    /// A session was rejected at the gate.
    SessionRejected {
        /// Which validation step failed.
        reason: String,
    },
    /// A declared system operation touched tenant-scoped data.
    SystemOperation,
    /// A security invariant was breached (strict-mode detection).
    SecurityViolation {
        /// Classification of the violation.
        violation_type: String,
    },
    /// Buffered events were evicted because the buffer cap was hit. The
    /// meta-event that records the loss is itself critical risk.
    EventsDropped {
        /// How many events were evicted.
        count: usize,
    },
}

impl AuditAction {
    /// Stable lowercase label used for aggregation keys.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::RecordCreated => "record_created",
            Self::RecordUpdated => "record_updated",
            Self::RecordDeleted => "record_deleted",
            Self::RecordUpserted => "record_upserted",
            Self::ScopeEstablished => "scope_established",
            Self::SessionRejected { .. } => "session_rejected",
            Self::SystemOperation => "system_operation",
            Self::SecurityViolation { .. } => "security_violation",
            Self::EventsDropped { .. } => "events_dropped",
        }
    }

    /// Human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::RecordCreated => "record created".to_string(),
            Self::RecordUpdated => "record updated".to_string(),
            Self::RecordDeleted => "record deleted".to_string(),
            Self::RecordUpserted => "record upserted".to_string(),
            Self::ScopeEstablished => "context scope established".to_string(),
            Self::SessionRejected { reason } => {
                format!("session rejected: {reason}")
            },
            Self::SystemOperation => "system operation on tenant data".to_string(),
            Self::SecurityViolation { violation_type } => {
                format!("security violation: {violation_type}")
            },
            Self::EventsDropped { count } => {
                format!("{count} buffered audit events dropped")
            },
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure {
        /// Error message.
        error: String,
    },
}

impl AuditOutcome {
    /// Success outcome.
    #[must_use]
    pub fn success() -> Self {
        Self::Success
    }

    /// Failure outcome with an error message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether this is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
