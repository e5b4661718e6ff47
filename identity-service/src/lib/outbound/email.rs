use async_trait::async_trait;

use crate::identity::errors::MailerError;
use crate::identity::ports::ConfirmationMailer;

/// Mailer that logs instead of sending.
///
/// Email transport is owned by an external collaborator; this adapter keeps
/// wiring and local runs working without one.
pub struct NoopMailer;

impl NoopMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationMailer for NoopMailer {
    async fn send_confirmation(
        &self,
        email: &str,
        username: &str,
        _token: &str,
    ) -> Result<(), MailerError> {
        tracing::info!(email = %email, username = %username, "Confirmation email suppressed (noop mailer)");
        Ok(())
    }
}
