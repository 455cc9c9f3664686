//! The invoice signing protocol.
//!
//! ```text
//! issue:    Draft --(advance + insert token, one tx)--> AwaitingPayment, then mail link
//! resolve:  token -> priced estimate (read only)
//! consume:  token -> validate upload -> store object -> (signature key + InProgress + used_at, one tx)
//! ```
//!
//! The object store is outside the transaction. The upload happens first;
//! if the commit then fails the object is left orphaned under its
//! deterministic key and a retry overwrites it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};

use crate::clock::Clock;
use crate::db::token_repo::{self, InvoiceToken};
use crate::db::{estimate_repo, user_repo, Database};
use crate::error::{ErrorClass, StorageError};
use crate::estimate::model::{Estimate, User};
use crate::estimate::service::{self as estimate_service, PricedEstimate};
use crate::estimate::{EstimateError, EstimateStatus, PricingPolicy, Transition};
use crate::mailer::{InvoiceLinkData, Mailer};
use crate::sanitize;
use crate::storage::{signature_key, ObjectStore, StoredObject};

use super::error::InvoiceError;
use super::link;
use super::token::{self, GeneratedToken, TokenHash};
use super::upload::{SignatureUpload, UploadPolicy};

/// Default lifetime of a signing link.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

#[derive(Debug, Clone)]
pub struct InvoiceSettings {
    /// Public base URL of the application, without trailing slash.
    pub base_url: String,
    pub token_ttl: Duration,
    pub upload: UploadPolicy,
}

impl InvoiceSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            upload: UploadPolicy::default(),
        }
    }
}

/// A minted signing link. The URL holds the raw token and is only ever
/// returned here and in the outgoing mail.
#[derive(Debug)]
pub struct IssuedInvoice {
    pub estimate_id: i64,
    /// The Draft exit, for a first issue; `None` for a resend.
    pub transition: Option<Transition>,
    pub token_id: i64,
    pub expires_at: DateTime<Utc>,
    pub signing_url: SecretString,
}

/// What the customer sees when opening a signing link.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub invoice: PricedEstimate,
    pub customer_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedInvoice {
    pub estimate_id: i64,
    pub object_key: String,
    pub status: EstimateStatus,
    pub signed_at: DateTime<Utc>,
}

/// Looks up a token by hash and checks it can still be redeemed.
///
/// Every failure collapses to `InvalidOrExpired`; the cause is only logged.
fn usable_token(
    conn: &Connection,
    hash: &TokenHash,
    now: DateTime<Utc>,
) -> Result<InvoiceToken, InvoiceError> {
    let Some(record) = token_repo::find_by_hash(conn, hash.as_str())? else {
        debug!(reason = "unknown", "Invoice link rejected");
        return Err(InvoiceError::InvalidOrExpired);
    };

    if !record.is_usable_at(now) {
        let reason = if record.used_at.is_some() {
            "used"
        } else if record.revoked_at.is_some() {
            "revoked"
        } else {
            "expired"
        };
        debug!(reason, estimate_id = record.estimate_id, "Invoice link rejected");
        return Err(InvoiceError::InvalidOrExpired);
    }

    Ok(record)
}

fn load_customer(conn: &Connection, estimate: &Estimate) -> Result<User, InvoiceError> {
    let customer_id = estimate.customer_id();
    user_repo::get(conn, customer_id)?
        .ok_or_else(|| EstimateError::CustomerNotFound { customer_id }.into())
}

/// Whether a signature may still be taken for the estimate.
fn awaits_signature(estimate: &Estimate) -> bool {
    estimate.status > EstimateStatus::Draft && estimate.status.can_jump_to_in_progress()
}

fn log_dependency_failure(err: &InvoiceError, what: &str) {
    if err.class() == ErrorClass::Dependency {
        error!(error = %err, "{}", what);
    }
}

/// Issues, resolves and redeems single-use invoice signing links.
pub struct InvoiceService {
    db: Database,
    store: Arc<dyn ObjectStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    pricing: Arc<PricingPolicy>,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(
        db: Database,
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        pricing: Arc<PricingPolicy>,
        settings: InvoiceSettings,
    ) -> Self {
        Self {
            db,
            store,
            mailer,
            clock,
            pricing,
            settings,
        }
    }

    pub fn settings(&self) -> &InvoiceSettings {
        &self.settings
    }

    /// Moves a Draft estimate to AwaitingPayment and mails a signing link.
    ///
    /// The status change and token insert commit together. Mail goes out
    /// after the commit; a mail failure is returned but does not undo the
    /// commit, and the link can be reissued with
    /// [`resend_invoice_link`](Self::resend_invoice_link).
    pub async fn issue(&self, estimate_id: i64) -> Result<IssuedInvoice, InvoiceError> {
        let span = info_span!("invoice.issue", estimate_id);
        async move {
            let token = token::generate()?;
            let now = self.clock.now();
            let expires_at = now + self.settings.token_ttl;

            let (transition, record, customer) = self
                .db
                .with_transaction(|tx| {
                    let estimate = estimate_service::load(tx, estimate_id)?;
                    if estimate.status != EstimateStatus::Draft {
                        return Err(InvoiceError::NotIssuable {
                            estimate_id,
                            status: estimate.status,
                        });
                    }
                    let customer = load_customer(tx, &estimate)?;
                    let transition = estimate_service::advance_in(tx, estimate_id)?;
                    let record =
                        token_repo::insert(tx, estimate_id, token.hash.as_str(), expires_at, now)?;
                    Ok((transition, record, customer))
                })
                .inspect_err(|e| log_dependency_failure(e, "Failed to issue invoice link"))?;

            info!(
                from = %transition.from,
                to = %transition.to,
                token = %sanitize::token_fingerprint(&token.hash),
                %expires_at,
                "Invoice link issued"
            );

            self.deliver(estimate_id, Some(transition), record, &customer, token)
                .await
        }
        .instrument(span)
        .await
    }

    /// Revokes any outstanding link for the estimate and mails a fresh one.
    ///
    /// Only allowed while the estimate is past Draft, before In Progress and
    /// unsigned.
    pub async fn resend_invoice_link(
        &self,
        estimate_id: i64,
    ) -> Result<IssuedInvoice, InvoiceError> {
        let span = info_span!("invoice.resend", estimate_id);
        async move {
            let token = token::generate()?;
            let now = self.clock.now();
            let expires_at = now + self.settings.token_ttl;

            let (revoked, record, customer) = self
                .db
                .with_transaction(|tx| {
                    let estimate = estimate_service::load(tx, estimate_id)?;
                    if estimate.is_signed() {
                        return Err(InvoiceError::AlreadySigned { estimate_id });
                    }
                    if !awaits_signature(&estimate) {
                        return Err(InvoiceError::NotAwaitingSignature {
                            estimate_id,
                            status: estimate.status,
                        });
                    }
                    let customer = load_customer(tx, &estimate)?;
                    let revoked = token_repo::revoke_outstanding(tx, estimate_id, now)?;
                    let record =
                        token_repo::insert(tx, estimate_id, token.hash.as_str(), expires_at, now)?;
                    Ok((revoked, record, customer))
                })
                .inspect_err(|e| log_dependency_failure(e, "Failed to reissue invoice link"))?;

            info!(
                revoked,
                token = %sanitize::token_fingerprint(&token.hash),
                %expires_at,
                "Invoice link reissued"
            );

            self.deliver(estimate_id, None, record, &customer, token).await
        }
        .instrument(span)
        .await
    }

    async fn deliver(
        &self,
        estimate_id: i64,
        transition: Option<Transition>,
        record: InvoiceToken,
        customer: &User,
        token: GeneratedToken,
    ) -> Result<IssuedInvoice, InvoiceError> {
        let signing_url = link::signing_url(&self.settings.base_url, &token.raw);
        let data = InvoiceLinkData {
            customer_name: customer.name.clone(),
            estimate_number: estimate_id,
            signing_url: signing_url.clone(),
            human_expiry: link::human_expiry(record.expires_at),
        };

        let to = sanitize::redact_email(&customer.email);
        if let Err(e) = self.mailer.send_invoice_link(&customer.email, &data).await {
            error!(error = %e, %to, "Failed to send invoice link; link remains valid for resend");
            return Err(e.into());
        }
        info!(%to, "Invoice link sent");

        Ok(IssuedInvoice {
            estimate_id,
            transition,
            token_id: record.id,
            expires_at: record.expires_at,
            signing_url,
        })
    }

    /// Validates a raw token and returns the invoice for display.
    ///
    /// Read only: resolving never consumes or extends the token.
    pub fn resolve(&self, raw_token: &str) -> Result<InvoiceView, InvoiceError> {
        let hash = TokenHash::of(raw_token);
        let _span = info_span!("invoice.resolve", token = %sanitize::token_fingerprint(&hash))
            .entered();
        let now = self.clock.now();

        self.db
            .with_conn(|conn| -> Result<InvoiceView, InvoiceError> {
                let record = usable_token(conn, &hash, now)?;
                let estimate = estimate_repo::get(conn, record.estimate_id)?
                    .ok_or(InvoiceError::InvalidOrExpired)?;
                let customer_name = load_customer(conn, &estimate)?.name;
                let invoice = estimate_service::priced_in(conn, &self.pricing, estimate)?;
                Ok(InvoiceView {
                    invoice,
                    customer_name,
                    expires_at: record.expires_at,
                })
            })
            .inspect_err(|e| log_dependency_failure(e, "Failed to resolve invoice link"))
    }

    /// Redeems a token with the customer's signature.
    ///
    /// Checks, in order: the token, that the estimate is unsigned, then the
    /// upload. The object is stored before the commit; the signature key,
    /// the move to In Progress and the token's `used_at` then commit together.
    pub async fn consume(
        &self,
        raw_token: &str,
        upload: SignatureUpload,
    ) -> Result<SignedInvoice, InvoiceError> {
        let hash = TokenHash::of(raw_token);
        let span = info_span!(
            "invoice.consume",
            token = %sanitize::token_fingerprint(&hash),
            estimate_id = field::Empty,
        );
        async move {
            let now = self.clock.now();
            let (token_id, estimate_id) = self
                .db
                .with_conn(|conn| {
                    let record = usable_token(conn, &hash, now)?;
                    let estimate = estimate_repo::get(conn, record.estimate_id)?
                        .ok_or(InvoiceError::InvalidOrExpired)?;
                    if estimate.is_signed() {
                        return Err(InvoiceError::AlreadySigned {
                            estimate_id: estimate.id,
                        });
                    }
                    Ok((record.id, estimate.id))
                })
                .inspect_err(|e| log_dependency_failure(e, "Failed to load invoice link"))?;
            Span::current().record("estimate_id", estimate_id);

            if let Err(e) = self.settings.upload.validate(&upload) {
                warn!(error = %e, "Signature upload rejected");
                return Err(e);
            }

            let key = signature_key(estimate_id);
            if let Err(e) = self
                .store
                .upload(&key, &upload.content, &upload.content_type)
                .await
            {
                error!(error = %e, key = %key, "Failed to store signature");
                return Err(e.into());
            }

            let signed_at = self.clock.now();
            self.db
                .with_transaction(|tx| {
                    let record = token_repo::find_by_id(tx, token_id)?
                        .filter(|t| t.is_usable_at(signed_at))
                        .ok_or(InvoiceError::InvalidOrExpired)?;
                    let estimate = estimate_repo::get(tx, record.estimate_id)?
                        .ok_or(InvoiceError::InvalidOrExpired)?;
                    if estimate.is_signed() {
                        return Err(InvoiceError::AlreadySigned { estimate_id });
                    }
                    if !estimate_repo::record_signature(
                        tx,
                        estimate_id,
                        &key,
                        EstimateStatus::InProgress,
                    )? {
                        return Err(InvoiceError::NotAwaitingSignature {
                            estimate_id,
                            status: estimate.status,
                        });
                    }
                    if !token_repo::mark_used(tx, token_id, signed_at)? {
                        return Err(InvoiceError::InvalidOrExpired);
                    }
                    Ok(())
                })
                .inspect_err(|e| {
                    log_dependency_failure(e, "Signature commit failed; stored object is orphaned")
                })?;

            info!(key = %key, size = upload.size(), "Invoice signed");

            Ok(SignedInvoice {
                estimate_id,
                object_key: key,
                status: EstimateStatus::InProgress,
                signed_at,
            })
        }
        .instrument(span)
        .await
    }

    /// Fetches the stored signature image of an estimate.
    pub async fn signature(&self, estimate_id: i64) -> Result<StoredObject, InvoiceError> {
        let key = self.db.with_conn(|conn| {
            estimate_service::load(conn, estimate_id)?
                .signature_object_key
                .ok_or(InvoiceError::SignatureNotFound { estimate_id })
        })?;

        match self.store.fetch(&key).await {
            Ok(object) => Ok(object),
            Err(StorageError::NotFound(_)) => {
                warn!(estimate_id, key = %key, "Signature recorded but object missing");
                Err(InvoiceError::SignatureNotFound { estimate_id })
            }
            Err(e) => {
                error!(estimate_id, error = %e, "Failed to fetch signature");
                Err(e.into())
            }
        }
    }
}
