//! Aegis Test - in-memory doubles and fixtures shared across crate tests.
//!
//! Nothing here is production code: the data source evaluates only the
//! filter shapes the guard emits, the secret store is a map, and the flaky
//! sink exists to fail on purpose.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod fixtures;
mod secrets;
mod sink;
mod source;
mod tracing;

pub use fixtures::{active_org, active_session, admin_ctx, member_ctx, read_only_ctx};
pub use secrets::MemorySecretStore;
pub use sink::FlakyAuditSink;
pub use source::MemoryDataSource;
pub use tracing::init_tracing;
