use crate::domain::repository::Mailer;
use crate::domain::types::Email;
use crate::error::ApiError;

/// Delivers mail to the structured log. Used in development and tests,
/// where no SMTP relay is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), ApiError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "email sent"
        );
        Ok(())
    }
}
