//! Outbound mail delivery abstraction.
//!
//! OTP mail is fire-and-forget: handlers hand the message to a background
//! task and answer the client without waiting for delivery. A failed send is
//! logged and dropped; the client recovers by requesting a fresh code.
//!
//! The default sender for local dev is `LogMailSender`, which logs the
//! message and returns `Ok(())`. Real deployments implement `MailSender`
//! over SMTP or a provider API.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery abstraction.
pub trait MailSender: Send + Sync {
    /// Deliver a message or return an error to have it logged and dropped.
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real mail.
#[derive(Clone, Debug)]
pub struct LogMailSender;

impl MailSender for LogMailSender {
    fn send(&self, message: &MailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail send stub"
        );
        Ok(())
    }
}

/// Hand a message to a background task and return immediately.
pub fn send_in_background(sender: Arc<dyn MailSender>, message: MailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message) {
            error!(to = %message.to, subject = %message.subject, "mail send failed: {err}");
        }
    });
}
