//! Outbound SMTP mailer for customer communications.
//!
//! When SMTP is disabled (the dev default) the mailer behaves as a mock:
//! sends are logged and reported as successful without touching the network.

use crate::config::SmtpConfig;
use crate::services::metrics::EMAILS_TOTAL;
use backoffice_core::error::AppError;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

pub struct Mailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Result<Self, AppError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::EmailError(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    /// Send a plain-text email. Returns `true` when actually delivered,
    /// `false` on the mock path.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<bool, AppError> {
        let Some(transport) = self.transport.as_ref() else {
            tracing::info!(to = %to, subject = %subject, "SMTP disabled; logging email instead of sending");
            EMAILS_TOTAL.with_label_values(&["mock"]).inc();
            return Ok(false);
        };

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| AppError::EmailError(format!("Invalid from address: {}", e)))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::EmailError(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(message).await.map_err(|e| {
            EMAILS_TOTAL.with_label_values(&["failed"]).inc();
            AppError::EmailError(format!("Failed to send email: {}", e))
        })?;

        EMAILS_TOTAL.with_label_values(&["sent"]).inc();
        Ok(true)
    }
}
