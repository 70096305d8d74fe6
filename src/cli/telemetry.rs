//! Tracing subscriber setup.
//!
//! Structured JSON logs go to stdout. The `-v` count picks the default
//! level; `RUST_LOG` overrides it when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Initialize the global subscriber for the given `-v` count.
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    Registry::default()
        .with(filter)
        .with(fmt::layer().json())
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
}
