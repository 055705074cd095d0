#![allow(dead_code)]

pub mod graph;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Route walker logs to the test output; `RUST_LOG=bit_revwalk=trace` shows
/// every stage decision
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
