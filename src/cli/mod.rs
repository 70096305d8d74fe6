//! Command-line entry: argument parsing, telemetry, and action dispatch.

pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod telemetry;

use actions::Action;
use anyhow::Result;

/// Parse the command line, bring up tracing, and build the action the
/// binary runs.
///
/// # Errors
/// Returns an error when telemetry setup or dispatch fails; argument
/// errors exit through clap.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(matches.get_count(commands::ARG_VERBOSITY))?;

    dispatch::handler(&matches)
}
