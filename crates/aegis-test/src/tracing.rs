//! Tracing bootstrap for tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Respects `RUST_LOG`; defaults to `warn` so passing tests stay quiet.
/// Safe to call from every test.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
