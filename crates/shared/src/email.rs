//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. When `disabled` is set in the
//! configuration, sends are skipped entirely so development environments
//! never deliver real mail.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Returns true if sending is disabled by configuration.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(transport)
    }

    /// Sends a welcome email after registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_registration_email(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), EmailError> {
        let subject = "Welcome to Tally";
        let body = format!(
            r"Hi {to_name},

Thank you for registering with Tally. We're excited to have you on board!

Best regards,
The Tally Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Sends a transfer notification to the sender.
    ///
    /// Best-effort: callers are expected to spawn this and log failures,
    /// never to fail a committed transfer because of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_transfer_notification(
        &self,
        to_email: &str,
        to_name: &str,
        amount: Decimal,
        to_account: &str,
    ) -> Result<(), EmailError> {
        let subject = "Transfer completed - Tally";
        let body = format!(
            r"Hi {to_name},

A transfer of {amount} has been made to account {to_account}.

Best regards,
The Tally Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Sends a transfer failure alert to the sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_transfer_failure_email(
        &self,
        to_email: &str,
        to_name: &str,
        amount: Decimal,
        to_account: &str,
    ) -> Result<(), EmailError> {
        let subject = "Transfer failed - Tally";
        let body = format!(
            r"Hi {to_name},

A transfer of {amount} to account {to_account} has failed.

Best regards,
The Tally Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Sends a generic plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        if self.config.disabled {
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_disabled_service() {
        let service = EmailService::new(EmailConfig::default());
        assert!(service.is_disabled());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let service = EmailService::new(EmailConfig::default());
        let result = service
            .send_transfer_notification("demo@example.com", "Demo", dec!(500), "acct-1")
            .await;
        assert!(result.is_ok());
    }
}
