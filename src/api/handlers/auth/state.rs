//! Auth configuration shared across handlers.

use secrecy::SecretString;

use crate::session::Environment;

const DEFAULT_SENDER_EMAIL: &str = "noreply@crunchy.dev";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    environment: Environment,
    token_secret: SecretString,
    sender_email: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, token_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            environment: Environment::Development,
            token_secret,
            sender_email: DEFAULT_SENDER_EMAIL.to_string(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_sender_email(mut self, sender_email: String) -> Self {
        self.sender_email = sender_email;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }
}
