//! Tracing setup for hosts embedding the engine.

use tracing_subscriber::EnvFilter;

/// Initializes a global `tracing` subscriber.
///
/// Respects `RUST_LOG` when set, otherwise falls back to `default_filter`
/// (e.g. `"treadle=info"`). Safe to call more than once; later calls are
/// no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("treadle=debug");
        init_tracing("treadle=info");
        tracing::debug!("subscriber installed");
    }
}
