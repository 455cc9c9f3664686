use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{InvoiceLinkData, Mailer, MailerError};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest relay error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    html: String,
    text: String,
}

/// Delivers mail by POSTing JSON to an HTTP mail relay.
pub struct WebhookMailer {
    client: Client,
    endpoint: String,
    from: String,
    api_key: Option<SecretString>,
}

fn create_http_client() -> Result<Client, MailerError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| MailerError::Client(e.to_string()))
}

impl WebhookMailer {
    pub fn new(
        endpoint: impl Into<String>,
        from: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self, MailerError> {
        Ok(Self {
            client: create_http_client()?,
            endpoint: endpoint.into(),
            from: from.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send_invoice_link(
        &self,
        to: &str,
        data: &InvoiceLinkData,
    ) -> Result<(), MailerError> {
        let message = OutboundMessage {
            from: &self.from,
            to,
            subject: data.subject(),
            html: data.render_html(),
            text: data.render_text(),
        };

        let mut request = self.client.post(&self.endpoint).json(&message);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailerError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(MailerError::Rejected { status, body });
        }

        Ok(())
    }
}
