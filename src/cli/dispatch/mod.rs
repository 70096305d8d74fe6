//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action the binary executes.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    ARG_DSN, ARG_ENVIRONMENT, ARG_FRONTEND_URL, ARG_PORT, ARG_SENDER_EMAIL, ARG_TOKEN_SECRET,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let frontend_base_url = matches
        .get_one::<String>(ARG_FRONTEND_URL)
        .cloned()
        .context("missing required argument: --frontend-url")?;
    let token_secret = matches
        .get_one::<String>(ARG_TOKEN_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --token-secret")?;
    let sender_email = matches.get_one::<String>(ARG_SENDER_EMAIL).cloned();
    let environment = matches
        .get_one::<String>(ARG_ENVIRONMENT)
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url,
        token_secret,
        sender_email,
        environment,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn builds_server_action_from_flags() {
        temp_env::with_vars(
            [
                ("CRUNCHY_DSN", None::<&str>),
                ("CRUNCHY_TOKEN_SECRET", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "crunchy",
                    "--dsn",
                    "postgres://user@localhost:5432/crunchy",
                    "--token-secret",
                    "hmac-secret",
                    "--environment",
                    "production",
                ]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/crunchy");
                    assert_eq!(args.environment, "production");
                    assert!(args.sender_email.is_none());
                }
            },
        );
    }
}
