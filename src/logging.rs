// 📝 Logging setup shared by the CLI, the TUI and the API server

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "owner_statements=info";

/// Install the global fmt subscriber. Safe to call more than once.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `info`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        // try_init: tests and embedding binaries may already own a subscriber
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Only install logging when the operator asked for it via `RUST_LOG`.
///
/// The terminal report owns the screen, so by default it stays quiet.
pub fn init_tracing_if_requested() {
    if std::env::var_os("RUST_LOG").is_some() {
        init_tracing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("logging initialised twice without panicking");
    }
}
