//! Outgoing email: OTP messages sent over SMTP, dispatched off the request path.

use crate::config::SmtpSettings;
use crate::error::AppError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, AppError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| AppError::Mail(format!("MAIL_FROM: {}", e)))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| AppError::Mail(format!("smtp relay: {}", e)))?
            .port(settings.port);
        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }
        Ok(SmtpMailer {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::Mail(format!("recipient {}: {}", email.to, e)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| AppError::Mail(e.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpPurpose {
    ConfirmEmail,
    ResetPassword,
}

pub fn otp_email(app_name: &str, purpose: OtpPurpose, to: &str, code: &str) -> Email {
    let (subject, lead) = match purpose {
        OtpPurpose::ConfirmEmail => ("Confirm your email", "Use this code to confirm your email address"),
        OtpPurpose::ResetPassword => ("Reset your password", "Use this code to reset your password"),
    };
    Email {
        to: to.to_string(),
        subject: format!("{} - {}", app_name, subject),
        html: format!(
            "<p>{}:</p><h2 style=\"letter-spacing:4px\">{}</h2><p>If you did not ask for this, ignore this email.</p>",
            lead, code
        ),
    }
}

/// Send without blocking the caller; failures are logged.
pub fn send_in_background(mailer: Arc<dyn Mailer>, email: Email) {
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            tracing::error!(to = %to, error = %e, "email delivery failed");
        }
    });
}
