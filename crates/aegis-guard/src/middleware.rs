//! Operation rewriting: tenant confinement and field encryption.
//!
//! [`TenantGuard::apply`] rewrites an operation in place before it reaches
//! the data source. Filters never replace what the caller asked for; the
//! tenant predicate is AND-merged on top, so a hostile filter naming
//! another tenant still matches nothing outside the caller's partition.

use std::sync::Arc;

use aegis_core::{Role, SecurityContext, SecurityError};
use aegis_crypto::{mask, FieldCipher};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{GuardError, GuardResult};
use crate::operation::{DataAction, DataOperation};
use crate::registry::{ModelRegistry, ModelScope};

/// Canonical name of the tenant discriminator column.
pub const TENANT_FIELD: &str = "tenant_id";

/// Number of trailing characters left visible when masking for read-only
/// roles.
const MASK_SUFFIX: usize = 4;

/// How the guard reacts to operations it cannot fully classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Unknown models and cross-tenant rows are hard errors. For
    /// development, staging, and tests.
    Strict,
    /// Unknown models are logged and treated as tenant-scoped (fail
    /// closed); returned rows are not re-verified.
    Production,
}

/// What the guard decided about one operation.
#[derive(Debug, Clone)]
pub enum ScopeDecision {
    /// Rewritten and confined to the context's tenant.
    TenantScoped(SecurityContext),
    /// The model is system-scoped; passed through untouched.
    SystemModel,
    /// A system context (background job) is operating; passed through
    /// with the synthetic context attached for auditing.
    SystemContext(SecurityContext),
    /// No security context was bound. Logged loudly; only reachable from
    /// call paths that bypass scope establishment.
    Unscoped,
}

/// Tenant isolation middleware over intercepted data operations.
#[derive(Debug, Clone)]
pub struct TenantGuard {
    registry: Arc<ModelRegistry>,
    cipher: Option<Arc<FieldCipher>>,
    enforcement: Enforcement,
}

impl TenantGuard {
    /// Build a guard without field encryption.
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>, enforcement: Enforcement) -> Self {
        Self {
            registry,
            cipher: None,
            enforcement,
        }
    }

    /// Attach a field cipher for models with registered encrypted fields.
    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<FieldCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// The active enforcement mode.
    #[must_use]
    pub fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    /// Rewrite an operation so it is confined to the current tenant.
    ///
    /// Reads the security context bound to the current task. For
    /// tenant-scoped models this merges the tenant predicate into match
    /// filters, injects (and overwrites) the tenant id on create payloads,
    /// and encrypts registered sensitive fields in write payloads.
    ///
    /// # Errors
    ///
    /// - [`GuardError::Security`] for an unknown model under
    ///   [`Enforcement::Strict`].
    /// - [`GuardError::CipherMissing`] when encrypted fields are
    ///   registered but no cipher is attached.
    /// - [`GuardError::Crypto`] when field encryption fails.
    pub fn apply(&self, op: &mut DataOperation) -> GuardResult<ScopeDecision> {
        let scope = match self.registry.scope_of(&op.model) {
            Some(scope) => scope,
            None => match self.enforcement {
                Enforcement::Strict => {
                    return Err(SecurityError::UnclassifiedModel {
                        model: op.model.clone(),
                    }
                    .into());
                }
                Enforcement::Production => {
                    warn!(
                        model = %op.model,
                        "unclassified model, treating as tenant-scoped"
                    );
                    ModelScope::TenantScoped
                }
            },
        };

        if scope == ModelScope::SystemScoped {
            return Ok(ScopeDecision::SystemModel);
        }

        let Some(ctx) = aegis_context::current() else {
            warn!(
                model = %op.model,
                action = %op.action,
                "operation on tenant-scoped model with no security context"
            );
            return Ok(ScopeDecision::Unscoped);
        };

        if ctx.is_system() {
            debug!(
                model = %op.model,
                action = %op.action,
                actor = %ctx.user_id,
                "system context, passing through unscoped"
            );
            return Ok(ScopeDecision::SystemContext(ctx));
        }

        let tenant = ctx.tenant_id.as_str().to_owned();
        self.rewrite(op, &tenant)?;
        Ok(ScopeDecision::TenantScoped(ctx))
    }

    fn rewrite(&self, op: &mut DataOperation, tenant: &str) -> GuardResult<()> {
        match op.action {
            DataAction::FindUnique
            | DataAction::FindMany
            | DataAction::Count
            | DataAction::Aggregate
            | DataAction::Update
            | DataAction::UpdateMany
            | DataAction::Delete
            | DataAction::DeleteMany => {
                op.args.filter = Some(merge_tenant(op.args.filter.take(), tenant));
            }
            DataAction::Create | DataAction::CreateMany => {}
            DataAction::Upsert => {
                op.args.filter = Some(merge_tenant(op.args.filter.take(), tenant));
            }
        }

        // Payload side: tenant injection, then field encryption.
        match op.action {
            DataAction::Create => {
                if let Some(data) = op.args.data.as_mut() {
                    inject_tenant(data, tenant)?;
                    self.encrypt_payload(&op.model, data)?;
                }
            }
            DataAction::CreateMany => {
                if let Some(data) = op.args.data.as_mut() {
                    let Value::Array(items) = data else {
                        return Err(GuardError::InvalidArgs {
                            reason: "create_many data must be an array".into(),
                        });
                    };
                    for item in items {
                        inject_tenant(item, tenant)?;
                        self.encrypt_payload(&op.model, item)?;
                    }
                }
            }
            DataAction::Update | DataAction::UpdateMany => {
                if let Some(data) = op.args.data.as_mut() {
                    if strip_tenant(data) {
                        warn!(
                            model = %op.model,
                            action = %op.action,
                            "update payload tried to set the tenant discriminator; stripped"
                        );
                    }
                    self.encrypt_payload(&op.model, data)?;
                }
            }
            DataAction::Upsert => {
                if let Some(create) = op.args.create.as_mut() {
                    inject_tenant(create, tenant)?;
                    self.encrypt_payload(&op.model, create)?;
                }
                if let Some(update) = op.args.update.as_mut() {
                    if strip_tenant(update) {
                        warn!(
                            model = %op.model,
                            "upsert update branch tried to set the tenant discriminator; stripped"
                        );
                    }
                    self.encrypt_payload(&op.model, update)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Encrypt registered sensitive string fields of a payload in place.
    ///
    /// Null values pass through, and absent fields are skipped. A payload
    /// that is not a JSON object is rejected rather than silently left in
    /// plaintext.
    fn encrypt_payload(&self, model: &str, payload: &mut Value) -> GuardResult<()> {
        let fields = self.registry.encrypted_fields(model);
        if fields.is_empty() {
            return Ok(());
        }
        let cipher = self.cipher.as_ref().ok_or_else(|| GuardError::CipherMissing {
            model: model.to_owned(),
        })?;
        let obj = as_object_mut(payload)?;

        for field in fields {
            if let Some(value) = obj.get_mut(field) {
                match value {
                    Value::String(plain) => {
                        *value = Value::String(cipher.encrypt(plain)?);
                    }
                    Value::Null => {}
                    other => {
                        return Err(GuardError::InvalidArgs {
                            reason: format!(
                                "encrypted field {field} must be a string, got {other}"
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Re-check returned rows against the scoped tenant.
    ///
    /// Only active under [`Enforcement::Strict`]. Rows without the tenant
    /// discriminator (projections) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::TenantIsolationViolation`] for the first
    /// row belonging to a foreign tenant.
    pub fn verify_rows(
        &self,
        op: &DataOperation,
        ctx: &SecurityContext,
        rows: &[Value],
    ) -> GuardResult<()> {
        if self.enforcement != Enforcement::Strict {
            return Ok(());
        }
        let expected = ctx.tenant_id.as_str();
        for row in rows {
            if let Some(found) = row.get(TENANT_FIELD).and_then(Value::as_str) {
                if found != expected {
                    return Err(SecurityError::TenantIsolationViolation {
                        model: op.model.clone(),
                        action: op.action.label().to_owned(),
                        expected: expected.to_owned(),
                        found: found.to_owned(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Decrypt (or mask, for read-only roles) registered sensitive fields
    /// of returned rows in place.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Crypto`] when a stored token fails to
    /// decrypt; corrupt ciphertext is surfaced, never nulled.
    pub fn decrypt_rows(
        &self,
        model: &str,
        ctx: &SecurityContext,
        rows: &mut [Value],
    ) -> GuardResult<()> {
        let fields = self.registry.encrypted_fields(model);
        if fields.is_empty() || rows.is_empty() {
            return Ok(());
        }
        let cipher = self.cipher.as_ref().ok_or_else(|| GuardError::CipherMissing {
            model: model.to_owned(),
        })?;
        let mask_output = ctx.role == Role::ReadOnly;

        for row in rows {
            let Value::Object(obj) = row else { continue };
            for field in fields {
                if let Some(value) = obj.get_mut(field) {
                    if let Value::String(token) = value {
                        let plain = cipher.decrypt(token)?;
                        *value = if mask_output {
                            Value::String(mask(&plain, MASK_SUFFIX))
                        } else {
                            Value::String(plain)
                        };
                    }
                }
            }
        }
        Ok(())
    }
}

/// AND-merge the tenant predicate into a caller filter.
fn merge_tenant(filter: Option<Value>, tenant: &str) -> Value {
    let predicate = json!({ TENANT_FIELD: tenant });
    match filter {
        None => predicate,
        Some(existing) => json!({ "AND": [existing, predicate] }),
    }
}

/// Set the tenant discriminator on a create payload, overwriting any
/// caller-supplied value.
fn inject_tenant(payload: &mut Value, tenant: &str) -> GuardResult<()> {
    let obj = as_object_mut(payload)?;
    obj.insert(TENANT_FIELD.to_owned(), Value::String(tenant.to_owned()));
    Ok(())
}

/// Remove the tenant discriminator from an update payload. The scoped
/// filter decides which rows an update may touch; the payload must never
/// rewrite ownership, or a row would be transplanted into another
/// tenant's partition. Returns whether anything was removed.
fn strip_tenant(payload: &mut Value) -> bool {
    payload
        .as_object_mut()
        .is_some_and(|obj| obj.remove(TENANT_FIELD).is_some())
}

fn as_object_mut(payload: &mut Value) -> GuardResult<&mut Map<String, Value>> {
    payload.as_object_mut().ok_or_else(|| GuardError::InvalidArgs {
        reason: "payload must be a JSON object".into(),
    })
}
