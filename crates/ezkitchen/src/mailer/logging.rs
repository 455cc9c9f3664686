use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::info;

use crate::sanitize;

use super::{InvoiceLinkData, Mailer, MailerError};

/// Mailer that only records the send in the log. The link is redacted.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_invoice_link(
        &self,
        to: &str,
        data: &InvoiceLinkData,
    ) -> Result<(), MailerError> {
        info!(
            from = %self.from,
            to = %sanitize::redact_email(to),
            subject = %data.subject(),
            link = %sanitize::redact_signing_url(data.signing_url.expose_secret()),
            expires = %data.human_expiry,
            "Invoice link mail (log only)"
        );
        Ok(())
    }
}
