//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr so plan output on stdout stays clean enough to
//! pipe.  `RUST_LOG` overrides the level chosen by the verbose flag.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.  Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
