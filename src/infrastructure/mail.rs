//! Mail delivery backends.

use async_trait::async_trait;

use crate::domain::errors::AuthError;
use crate::domain::notifications::{MailMessage, Mailer};

/// Writes every message to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), AuthError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Outgoing mail"
        );
        Ok(())
    }
}
