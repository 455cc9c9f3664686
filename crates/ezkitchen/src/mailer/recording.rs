use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{InvoiceLinkData, Mailer, MailerError};

/// A captured send.
#[derive(Debug, Clone)]
pub struct SentInvoiceLink {
    pub to: String,
    pub data: InvoiceLinkData,
}

/// Mailer that keeps every message in memory. Sends can be made to fail.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentInvoiceLink>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent send fails with `Unavailable`.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentInvoiceLink> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<SentInvoiceLink> {
        self.sent().pop()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invoice_link(
        &self,
        to: &str,
        data: &InvoiceLinkData,
    ) -> Result<(), MailerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailerError::Unavailable("recording mailer set to fail".to_string()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailerError::Unavailable("recording mailer lock poisoned".to_string()))?;
        sent.push(SentInvoiceLink {
            to: to.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}
