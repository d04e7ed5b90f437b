//! Tracing initialization for binaries and tests embedding the ledger.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Filtering comes from `RUST_LOG`
/// (default `info`); set `LOG_FORMAT=json` for machine-readable output.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
