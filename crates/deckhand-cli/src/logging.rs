//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout carries only the wrapped tool's output.
//! `RUST_LOG` takes precedence over the default level unless `--debug` is set.

use tracing_subscriber::{EnvFilter, fmt};

pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (e.g. in tests) is harmless.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
