//! Shared pipeline assembly for the end-to-end tests.

#![allow(dead_code)]

use std::sync::Arc;

use aegis_audit::{AuditLogger, FlushPolicy, MemorySink};
use aegis_crypto::FieldCipher;
use aegis_guard::{Enforcement, GuardedClient, ModelRegistry, TenantGuard};
use aegis_test::MemoryDataSource;

/// A fully wired guard pipeline over in-memory collaborators.
pub struct Pipeline {
    pub client: GuardedClient,
    pub source: Arc<MemoryDataSource>,
    pub sink: Arc<MemorySink>,
    pub audit: AuditLogger,
}

/// Strict-enforcement pipeline with the standard model registry:
/// `Client` (tenant-scoped), `Document` (tenant-scoped, `ssn` encrypted),
/// `Organization` (system-scoped).
pub fn pipeline() -> Pipeline {
    aegis_test::init_tracing();
    let registry = Arc::new(
        ModelRegistry::builder()
            .tenant_scoped("Client")
            .tenant_scoped_encrypted("Document", vec!["ssn".into()])
            .system_scoped("Organization")
            .build(),
    );
    let guard = TenantGuard::new(registry, Enforcement::Strict)
        .with_cipher(Arc::new(FieldCipher::new([7u8; 32])));
    let source = Arc::new(MemoryDataSource::new());
    let sink = Arc::new(MemorySink::new());
    let audit = AuditLogger::new(sink.clone(), FlushPolicy::default());
    Pipeline {
        client: GuardedClient::new(guard, source.clone(), audit.clone()),
        source,
        sink,
        audit,
    }
}
