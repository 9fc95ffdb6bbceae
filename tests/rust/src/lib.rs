//! Shared helpers for the integration test binaries

/// Route tracing output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interrupt_gate=debug,cleanstop_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
