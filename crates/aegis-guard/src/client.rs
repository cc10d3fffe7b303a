//! The guarded data-access client.
//!
//! [`GuardedClient`] is the single entry point callers go through: every
//! operation is rewritten by the [`TenantGuard`], executed against the
//! [`DataSource`], re-verified where enforcement demands it, decrypted on
//! the way out, and audited when it mutates tenant-scoped data.

use std::sync::Arc;

use aegis_audit::{AuditAction, AuditEvent, AuditLogger};
use aegis_core::{RiskLevel, SecurityContext, SecurityError};
use async_trait::async_trait;
use serde_json::json;

use crate::error::{GuardError, GuardResult};
use crate::middleware::{ScopeDecision, TenantGuard};
use crate::operation::{DataAction, DataOperation, QueryResult};

/// The external data-access layer the guard sits in front of.
///
/// Implementations receive operations that have already been rewritten;
/// they must apply the filter as given and must not add or remove tenant
/// predicates of their own.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Execute one rewritten operation.
    ///
    /// # Errors
    ///
    /// Implementations report storage failures as [`GuardError::Source`].
    async fn execute(&self, op: &DataOperation) -> GuardResult<QueryResult>;
}

/// Data-access client with tenant isolation, field encryption, and audit
/// logging applied around every call.
///
/// Cheap to clone; clones share the guard, source, and audit buffer.
#[derive(Clone)]
pub struct GuardedClient {
    guard: TenantGuard,
    source: Arc<dyn DataSource>,
    audit: AuditLogger,
}

impl GuardedClient {
    /// Assemble a client.
    #[must_use]
    pub fn new(guard: TenantGuard, source: Arc<dyn DataSource>, audit: AuditLogger) -> Self {
        Self {
            guard,
            source,
            audit,
        }
    }

    /// The guard this client applies.
    #[must_use]
    pub fn guard(&self) -> &TenantGuard {
        &self.guard
    }

    /// Run one operation through the full pipeline.
    ///
    /// # Errors
    ///
    /// Propagates guard rewrite errors, source failures, strict-mode
    /// isolation violations, and decryption failures. Audit logging never
    /// fails the operation it records.
    pub async fn execute(&self, mut op: DataOperation) -> GuardResult<QueryResult> {
        let decision = self.guard.apply(&mut op)?;
        let mut result = self.source.execute(&op).await?;

        match &decision {
            ScopeDecision::TenantScoped(ctx) => {
                if op.action.is_read() {
                    self.verify_and_decrypt(&op, ctx, &mut result).await?;
                } else {
                    self.audit_mutation(&op, ctx, &result).await;
                }
            }
            ScopeDecision::SystemContext(ctx) => {
                if op.action.is_read() {
                    // System reads legitimately span tenants, so there is
                    // no ownership to re-verify, but stored field tokens
                    // still come back decrypted.
                    self.guard.decrypt_rows(&op.model, ctx, &mut result.rows)?;
                } else if op.action.is_mutation() {
                    self.audit
                        .log(
                            AuditEvent::new(
                                ctx.user_id.clone(),
                                ctx.tenant_id.clone(),
                                AuditAction::SystemOperation,
                                op.model.clone(),
                            )
                            .with_risk(RiskLevel::Medium)
                            .with_details(json!({
                                "action": op.action.label(),
                                "affected": result.affected,
                            })),
                        )
                        .await;
                }
            }
            ScopeDecision::SystemModel | ScopeDecision::Unscoped => {}
        }

        Ok(result)
    }

    async fn verify_and_decrypt(
        &self,
        op: &DataOperation,
        ctx: &SecurityContext,
        result: &mut QueryResult,
    ) -> GuardResult<()> {
        if let Err(err) = self.guard.verify_rows(op, ctx, &result.rows) {
            if let GuardError::Security(SecurityError::TenantIsolationViolation {
                ref expected,
                ref found,
                ..
            }) = err
            {
                self.audit
                    .log(
                        AuditEvent::new(
                            ctx.user_id.clone(),
                            ctx.tenant_id.clone(),
                            AuditAction::SecurityViolation {
                                violation_type: "cross_tenant_row".into(),
                            },
                            op.model.clone(),
                        )
                        .with_risk(RiskLevel::Critical)
                        .with_details(json!({
                            "action": op.action.label(),
                            "expected": expected,
                            "found": found,
                        })),
                    )
                    .await;
            }
            return Err(err);
        }
        self.guard.decrypt_rows(&op.model, ctx, &mut result.rows)
    }

    async fn audit_mutation(
        &self,
        op: &DataOperation,
        ctx: &SecurityContext,
        result: &QueryResult,
    ) {
        let (action, risk) = match op.action {
            DataAction::Create | DataAction::CreateMany => {
                (AuditAction::RecordCreated, RiskLevel::Low)
            }
            DataAction::Update | DataAction::UpdateMany => {
                (AuditAction::RecordUpdated, RiskLevel::Low)
            }
            DataAction::Upsert => (AuditAction::RecordUpserted, RiskLevel::Low),
            DataAction::Delete | DataAction::DeleteMany => {
                (AuditAction::RecordDeleted, RiskLevel::Medium)
            }
            _ => return,
        };

        let mut event = AuditEvent::new(
            ctx.user_id.clone(),
            ctx.tenant_id.clone(),
            action,
            op.model.clone(),
        )
        .with_risk(risk)
        .with_details(json!({
            "action": op.action.label(),
            "affected": result.affected,
        }));

        // Single-record mutations carry the target id when the filter
        // names one.
        if let Some(id) = op
            .args
            .filter
            .as_ref()
            .and_then(|f| f.get("AND"))
            .and_then(|and| and.get(0))
            .and_then(|caller| caller.get("id"))
            .and_then(serde_json::Value::as_str)
        {
            event = event.with_resource_id(id);
        }

        self.audit.log(event).await;
    }
}

impl std::fmt::Debug for GuardedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedClient")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Enforcement;
    use crate::registry::ModelRegistry;
    use aegis_audit::{FlushPolicy, MemorySink};
    use aegis_core::{Role, SessionId};
    use aegis_crypto::FieldCipher;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Source that records the operations it receives and replays canned
    /// rows.
    struct RecordingSource {
        seen: Mutex<Vec<DataOperation>>,
        rows: Vec<Value>,
    }

    impl RecordingSource {
        fn returning(rows: Vec<Value>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                rows,
            }
        }

        fn last_op(&self) -> DataOperation {
            self.seen
                .lock()
                .expect("source lock")
                .last()
                .cloned()
                .expect("at least one op")
        }
    }

    #[async_trait]
    impl DataSource for RecordingSource {
        async fn execute(&self, op: &DataOperation) -> GuardResult<QueryResult> {
            self.seen.lock().expect("source lock").push(op.clone());
            if op.action.is_read() {
                Ok(QueryResult::with_rows(self.rows.clone()))
            } else {
                Ok(QueryResult::with_affected(1))
            }
        }
    }

    fn harness(rows: Vec<Value>) -> (GuardedClient, Arc<RecordingSource>, Arc<MemorySink>) {
        let registry = Arc::new(
            ModelRegistry::builder()
                .tenant_scoped("Client")
                .tenant_scoped_encrypted("Document", vec!["ssn".into()])
                .system_scoped("Organization")
                .build(),
        );
        let guard = TenantGuard::new(registry, Enforcement::Strict)
            .with_cipher(Arc::new(FieldCipher::new([7u8; 32])));
        let source = Arc::new(RecordingSource::returning(rows));
        let sink = Arc::new(MemorySink::new());
        let audit = AuditLogger::new(sink.clone(), FlushPolicy::default());
        (
            GuardedClient::new(guard, source.clone(), audit),
            source,
            sink,
        )
    }

    fn ctx(tenant: &str) -> SecurityContext {
        SecurityContext::new(tenant, "user_1", Role::Member, SessionId::new("sess_1"))
    }

    #[tokio::test]
    async fn source_sees_rewritten_operation() {
        let (client, source, _) = harness(vec![]);
        aegis_context::scope(ctx("org_A"), async move {
            client
                .execute(DataOperation::new("Client", DataAction::FindMany))
                .await
                .unwrap();
        })
        .await;
        assert_eq!(
            source.last_op().args.filter,
            Some(json!({"tenant_id": "org_A"}))
        );
    }

    #[tokio::test]
    async fn cross_tenant_row_fails_and_is_audited() {
        let (client, _, sink) = harness(vec![json!({"id": "c1", "tenant_id": "org_B"})]);
        let client2 = client.clone();
        let result = aegis_context::scope(ctx("org_A"), async move {
            client2
                .execute(DataOperation::new("Client", DataAction::FindMany))
                .await
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            GuardError::Security(SecurityError::TenantIsolationViolation { .. })
        ));

        // Critical events flush immediately to the sink.
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].action,
            AuditAction::SecurityViolation { .. }
        ));
        assert_eq!(events[0].risk, RiskLevel::Critical);
    }

    #[tokio::test]
    async fn read_decrypts_sensitive_fields() {
        let cipher = FieldCipher::new([7u8; 32]);
        let token = cipher.encrypt("123-45-6789").unwrap();
        let (client, _, _) =
            harness(vec![json!({"tenant_id": "org_A", "ssn": token})]);
        let rows = aegis_context::scope(ctx("org_A"), async move {
            client
                .execute(DataOperation::new("Document", DataAction::FindMany))
                .await
                .unwrap()
                .rows
        })
        .await;
        assert_eq!(rows[0]["ssn"], json!("123-45-6789"));
    }

    #[tokio::test]
    async fn system_read_decrypts_sensitive_fields() {
        let cipher = FieldCipher::new([7u8; 32]);
        let token = cipher.encrypt("123-45-6789").unwrap();
        let (client, _, _) = harness(vec![
            json!({"tenant_id": "org_A", "ssn": token.clone()}),
            json!({"tenant_id": "org_B", "ssn": token}),
        ]);
        let rows = aegis_context::system_scope("compliance_export", async move {
            client
                .execute(DataOperation::new("Document", DataAction::FindMany))
                .await
                .unwrap()
                .rows
        })
        .await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ssn"], json!("123-45-6789"));
        assert_eq!(rows[1]["ssn"], json!("123-45-6789"));
    }

    #[tokio::test]
    async fn mutation_emits_audit_event() {
        let (client, _, sink) = harness(vec![]);
        let client2 = client.clone();
        aegis_context::scope(ctx("org_A"), async move {
            client2
                .execute(
                    DataOperation::new("Client", DataAction::Delete)
                        .with_filter(json!({"id": "c9"})),
                )
                .await
                .unwrap();
        })
        .await;
        client.audit.flush().await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::RecordDeleted);
        assert_eq!(events[0].resource_id.as_deref(), Some("c9"));
        assert_eq!(events[0].tenant_id.as_str(), "org_A");
    }

    #[tokio::test]
    async fn reads_are_not_audited() {
        let (client, _, sink) = harness(vec![]);
        let client2 = client.clone();
        aegis_context::scope(ctx("org_A"), async move {
            client2
                .execute(DataOperation::new("Client", DataAction::FindMany))
                .await
                .unwrap();
        })
        .await;
        client.audit.flush().await.unwrap();
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn system_mutation_is_attributed() {
        let (client, source, sink) = harness(vec![]);
        let client2 = client.clone();
        aegis_context::system_scope("nightly_reconcile", async move {
            client2
                .execute(
                    DataOperation::new("Client", DataAction::UpdateMany)
                        .with_data(json!({"status": "archived"})),
                )
                .await
                .unwrap();
        })
        .await;
        client.audit.flush().await.unwrap();

        // The operation passed through unscoped.
        assert!(source.last_op().args.filter.is_none());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::SystemOperation);
        assert!(events[0].actor_user_id.as_str().starts_with("system:"));
    }
}
