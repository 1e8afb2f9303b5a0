//! Tracing subscriber setup shared by the bootstrap binary and the live test fixtures.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Honours `RUST_LOG`; falls back to `default_directive` (e.g. `"info"`). Repeated
/// calls are no-ops, so every test may call it.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
