//! Structured logging to stderr via `tracing`.
//!
//! `RUST_LOG` takes precedence. Without it the filter is `xsmon=warn`, or
//! `xsmon=debug` when `--verbose` is given.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset or unparsable.
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose { "xsmon=debug" } else { "xsmon=warn" }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("logger already initialized");
    }
}
