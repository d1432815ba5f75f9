//! Opt-in tracing output for debugging tests
//!
//! Call `init_tracing()` at the top of a test to see hub and adapter log
//! output. Controlled by `RUST_LOG`; defaults to `info`.

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .init();
});

/// Installs the test tracing subscriber once per process
pub fn init_tracing() {
    Lazy::force(&TRACING);
}
