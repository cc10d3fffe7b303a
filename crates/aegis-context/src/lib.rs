//! Aegis Context - request-scoped identity propagation.
//!
//! Binds a [`SecurityContext`] to an entire async call graph without
//! threading it through every function signature. The binding is a
//! structured scope: it lives exactly as long as the future passed to
//! [`scope`], follows that future across every await point, and can never
//! be observed by a sibling call tree. Tasks detached with `tokio::spawn`
//! start a fresh tree; use [`spawn_scoped`] when a child task must stay
//! bound to the caller's tenant.
//!
//! # Example
//!
//! ```
//! use aegis_context as context;
//! use aegis_core::{Role, SecurityContext, SessionId};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = SecurityContext::new("org_A", "user_1", Role::Member, SessionId::generate());
//!
//! let tenant = context::scope(ctx, async {
//!     // Anywhere inside the scope, the context is implicitly available.
//!     context::require_tenant_id().unwrap()
//! })
//! .await;
//!
//! assert_eq!(tenant.as_str(), "org_A");
//! assert!(context::current().is_none()); // nothing leaks past the scope
//! # }
//! ```
//!
//! # Why a task-local
//!
//! Emulating thread-locals over an async scheduler is unsound: a worker
//! thread interleaves many unrelated calls. `tokio::task_local!` instead
//! attaches the value to the *future*, so two concurrently executing scopes
//! never observe each other's context even when they share one scheduler
//! thread, and the binding is torn down deterministically when the scope's
//! future completes or is cancelled.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

use aegis_core::{SecurityContext, SecurityError, SecurityResult, TenantId, UserId};
use std::future::Future;
use tracing::debug;

tokio::task_local! {
    static CONTEXT: SecurityContext;
}

/// Execute `fut` with `ctx` bound for its entire call graph.
///
/// Returns the future's output unchanged. The binding is removed when the
/// future completes, errors, or is dropped mid-flight; it never leaks into
/// later, unrelated calls on the same worker.
pub async fn scope<F>(ctx: SecurityContext, fut: F) -> F::Output
where
    F: Future,
{
    CONTEXT.scope(ctx, fut).await
}

/// Execute `fut` under a synthetic system scope.
///
/// This is the only sanctioned way for background jobs to reach
/// tenant-scoped models without a user context: the middleware recognizes
/// the system role and passes the operation through, logged but exempt from
/// tenant predicates. User-facing request handling must never call this.
pub async fn system_scope<F>(reason: &str, fut: F) -> F::Output
where
    F: Future,
{
    debug!(reason, "entering system scope");
    CONTEXT.scope(SecurityContext::system(reason), fut).await
}

/// Spawn a task that inherits the current context.
///
/// Task-local bindings do not cross `tokio::spawn`; this captures the
/// caller's context (when one is bound) and re-establishes it inside the
/// new task so later continuations remain correctly scoped.
pub fn spawn_scoped<F>(fut: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(ctx) => tokio::spawn(CONTEXT.scope(ctx, fut)),
        None => tokio::spawn(fut),
    }
}

/// The context bound to the current call, if any.
#[must_use]
pub fn current() -> Option<SecurityContext> {
    CONTEXT.try_with(Clone::clone).ok()
}

/// The current tenant id.
///
/// # Errors
///
/// Returns [`SecurityError::ContextUnavailable`] when no scope is bound.
/// Callers must propagate this rather than defaulting to an unscoped state.
pub fn require_tenant_id() -> SecurityResult<TenantId> {
    CONTEXT
        .try_with(|ctx| ctx.tenant_id.clone())
        .map_err(|_| SecurityError::ContextUnavailable { what: "tenant_id" })
}

/// The current user id.
///
/// # Errors
///
/// Returns [`SecurityError::ContextUnavailable`] when no scope is bound.
pub fn require_user_id() -> SecurityResult<UserId> {
    CONTEXT
        .try_with(|ctx| ctx.user_id.clone())
        .map_err(|_| SecurityError::ContextUnavailable { what: "user_id" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{Role, SessionId};

    fn ctx(tenant: &str, user: &str) -> SecurityContext {
        SecurityContext::new(tenant, user, Role::Member, SessionId::generate())
    }

    #[tokio::test]
    async fn scope_binds_and_unbinds() {
        assert!(current().is_none());

        let seen = scope(ctx("org_A", "u1"), async { current() }).await;
        assert_eq!(seen.unwrap().tenant_id.as_str(), "org_A");

        assert!(current().is_none());
    }

    #[tokio::test]
    async fn scope_survives_await_points() {
        let tenant = scope(ctx("org_A", "u1"), async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            require_tenant_id().unwrap()
        })
        .await;
        assert_eq!(tenant.as_str(), "org_A");
    }

    #[tokio::test]
    async fn require_without_scope_fails() {
        let err = require_tenant_id().unwrap_err();
        assert!(matches!(
            err,
            SecurityError::ContextUnavailable { what: "tenant_id" }
        ));
        let err = require_user_id().unwrap_err();
        assert!(matches!(
            err,
            SecurityError::ContextUnavailable { what: "user_id" }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_scopes_never_cross() {
        let a = tokio::spawn(scope(ctx("org_A", "u1"), async {
            for _ in 0..100 {
                tokio::task::yield_now().await;
                assert_eq!(require_tenant_id().unwrap().as_str(), "org_A");
            }
            require_user_id().unwrap()
        }));
        let b = tokio::spawn(scope(ctx("org_B", "u2"), async {
            for _ in 0..100 {
                tokio::task::yield_now().await;
                assert_eq!(require_tenant_id().unwrap().as_str(), "org_B");
            }
            require_user_id().unwrap()
        }));

        assert_eq!(a.await.unwrap().as_str(), "u1");
        assert_eq!(b.await.unwrap().as_str(), "u2");
    }

    #[tokio::test]
    async fn nested_scope_shadows_then_restores() {
        scope(ctx("org_A", "u1"), async {
            assert_eq!(require_tenant_id().unwrap().as_str(), "org_A");
            scope(ctx("org_B", "u2"), async {
                assert_eq!(require_tenant_id().unwrap().as_str(), "org_B");
            })
            .await;
            assert_eq!(require_tenant_id().unwrap().as_str(), "org_A");
        })
        .await;
    }

    #[tokio::test]
    async fn cancelled_scope_leaves_nothing_behind() {
        let handle = tokio::spawn(scope(ctx("org_A", "u1"), async {
            std::future::pending::<()>().await;
        }));
        tokio::task::yield_now().await;
        handle.abort();
        let _ = handle.await;

        assert!(current().is_none());
    }

    #[tokio::test]
    async fn spawn_scoped_inherits_context() {
        let tenant = scope(ctx("org_A", "u1"), async {
            // A bare tokio::spawn would lose the binding here.
            spawn_scoped(async {
                tokio::task::yield_now().await;
                require_tenant_id().unwrap()
            })
            .await
            .unwrap()
        })
        .await;
        assert_eq!(tenant.as_str(), "org_A");
    }

    #[tokio::test]
    async fn system_scope_is_marked() {
        let is_system = system_scope("nightly-reindex", async {
            current().unwrap().is_system()
        })
        .await;
        assert!(is_system);
    }

    #[tokio::test]
    async fn scope_propagates_errors_unchanged() {
        let out: Result<(), &str> =
            scope(ctx("org_A", "u1"), async { Err("boom") }).await;
        assert_eq!(out.unwrap_err(), "boom");
    }
}
