use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::session::Environment;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub token_secret: SecretString,
    pub sender_email: Option<String>,
    pub environment: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the database is unreachable or the listener fails.
pub async fn execute(args: Args) -> Result<()> {
    let mut config = AuthConfig::new(args.frontend_base_url, args.token_secret)
        .with_environment(Environment::from_name(&args.environment));
    if let Some(sender_email) = args.sender_email {
        config = config.with_sender_email(sender_email);
    }

    api::new(args.port, args.dsn, config).await
}
