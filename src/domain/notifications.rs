//! Outbound notification contract.

use async_trait::async_trait;

use crate::domain::errors::AuthError;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers account emails (verification links, password reset links).
///
/// # Implementations
///
/// - [`crate::infrastructure::mail::LogMailer`] - writes messages to the log
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), AuthError>;
}
