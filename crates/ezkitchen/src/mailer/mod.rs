//! Outbound mail for invoice signing links.
//!
//! The signing flow calls [`Mailer::send_invoice_link`] once per issued link.
//! Delivery mechanics live behind the trait; a webhook implementation posts to
//! an HTTP mail relay and a logging implementation is used for local runs.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub mod logging;
pub mod recording;
pub mod webhook;

pub use logging::LogMailer;
pub use recording::{RecordingMailer, SentInvoiceLink};
pub use webhook::WebhookMailer;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Mail request failed: {0}")]
    Request(String),

    #[error("Mail relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail delivery unavailable: {0}")]
    Unavailable(String),
}

/// Everything the invoice mail needs.
#[derive(Debug, Clone)]
pub struct InvoiceLinkData {
    pub customer_name: String,
    pub estimate_number: i64,
    /// Contains the raw token; never log it unredacted.
    pub signing_url: SecretString,
    pub human_expiry: String,
}

impl InvoiceLinkData {
    pub fn subject(&self) -> String {
        format!("EzKitchen Invoice Agreement #{}", self.estimate_number)
    }

    /// HTML body with every interpolated value escaped.
    pub fn render_html(&self) -> String {
        let url = escape_html(self.signing_url.expose_secret());
        format!(
            "<p>Hello {name},</p>\n\
             <p>Your kitchen remodel estimate #{number} is ready for your signature.</p>\n\
             <p><a href=\"{url}\">Review and sign your invoice</a></p>\n\
             <p>This link can be used once and expires on {expiry}.</p>\n",
            name = escape_html(&self.customer_name),
            number = self.estimate_number,
            url = url,
            expiry = escape_html(&self.human_expiry),
        )
    }

    /// Plain-text alternative body.
    pub fn render_text(&self) -> String {
        format!(
            "Hello {},\n\nYour kitchen remodel estimate #{} is ready for your signature.\n\
             Review and sign it here: {}\n\nThis link can be used once and expires on {}.\n",
            self.customer_name,
            self.estimate_number,
            self.signing_url.expose_secret(),
            self.human_expiry,
        )
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invoice_link(&self, to: &str, data: &InvoiceLinkData)
        -> Result<(), MailerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> InvoiceLinkData {
        InvoiceLinkData {
            customer_name: "Cora <O'Neil>".to_string(),
            estimate_number: 12,
            signing_url: SecretString::from("https://ez.example/invoice/sign?token=a&b"),
            human_expiry: "Jan 5, 2026 3:04 PM".to_string(),
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(data().subject(), "EzKitchen Invoice Agreement #12");
    }

    #[test]
    fn test_html_is_escaped() {
        let html = data().render_html();
        assert!(html.contains("Cora &lt;O&#39;Neil&gt;"));
        assert!(html.contains("href=\"https://ez.example/invoice/sign?token=a&amp;b\""));
        assert!(html.contains("Jan 5, 2026 3:04 PM"));
        assert!(!html.contains("<O'Neil>"));
    }

    #[test]
    fn test_text_body() {
        let text = data().render_text();
        assert!(text.contains("estimate #12"));
        assert!(text.contains("token=a&b"));
    }

    #[test]
    fn test_debug_hides_link() {
        let debug = format!("{:?}", data());
        assert!(!debug.contains("token=a"));
    }
}
