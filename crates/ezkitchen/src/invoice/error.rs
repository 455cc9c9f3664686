use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{ErrorClass, StorageError, INTERNAL_ERROR_MESSAGE};
use crate::estimate::{EstimateError, EstimateStatus};
use crate::mailer::MailerError;

/// Text shown for every token failure, whatever the cause.
pub const INVALID_LINK_MESSAGE: &str = "This invoice link is invalid or has expired";

#[derive(Error, Debug)]
pub enum InvoiceError {
    /// Unknown, expired, used or revoked token, or its estimate is gone.
    #[error("invalid or expired invoice link")]
    InvalidOrExpired,

    #[error("Estimate {estimate_id} has already been signed")]
    AlreadySigned { estimate_id: i64 },

    #[error("Signature is {size} bytes; the limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Signature must be {expected}, got '{content_type}'")]
    UnsupportedMediaType {
        content_type: String,
        expected: String,
    },

    #[error("Signature upload is empty")]
    EmptyUpload,

    #[error("Estimate {estimate_id} is {status}; an invoice link can only be issued from Draft")]
    NotIssuable {
        estimate_id: i64,
        status: EstimateStatus,
    },

    #[error("Estimate {estimate_id} is {status} and is not awaiting a signature")]
    NotAwaitingSignature {
        estimate_id: i64,
        status: EstimateStatus,
    },

    #[error("No signature recorded for estimate {estimate_id}")]
    SignatureNotFound { estimate_id: i64 },

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mailer error: {0}")]
    Mailer(#[from] MailerError),

    #[error("Secure random source failed: {0}")]
    Randomness(String),
}

impl InvoiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            InvoiceError::InvalidOrExpired | InvoiceError::SignatureNotFound { .. } => {
                ErrorClass::NotFound
            }
            InvoiceError::AlreadySigned { .. }
            | InvoiceError::NotIssuable { .. }
            | InvoiceError::NotAwaitingSignature { .. } => ErrorClass::Conflict,
            InvoiceError::PayloadTooLarge { .. } => ErrorClass::PayloadTooLarge,
            InvoiceError::UnsupportedMediaType { .. } => ErrorClass::UnsupportedMediaType,
            InvoiceError::EmptyUpload => ErrorClass::Validation,
            InvoiceError::Estimate(e) => e.class(),
            InvoiceError::Database(_)
            | InvoiceError::Storage(_)
            | InvoiceError::Mailer(_)
            | InvoiceError::Randomness(_) => ErrorClass::Dependency,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            InvoiceError::Estimate(e) => e.status_code(),
            other => other.class().status_code(),
        }
    }

    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String {
        match self {
            InvoiceError::InvalidOrExpired => INVALID_LINK_MESSAGE.to_string(),
            InvoiceError::Estimate(e) => e.public_message(),
            other if other.class() == ErrorClass::Dependency => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
