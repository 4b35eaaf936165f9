// crates/pipeline-collector-service/src/telemetry.rs
// ============================================================================
// Module: Telemetry
// Description: Process-wide tracing subscriber installation.
// Dependencies: tracing-subscriber
// ============================================================================

use tracing_subscriber::EnvFilter;

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Later calls are no-ops once a global subscriber exists.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
}
