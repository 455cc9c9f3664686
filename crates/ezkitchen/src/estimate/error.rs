//! Estimate workflow error types.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{ErrorClass, INTERNAL_ERROR_MESSAGE};

use super::status::EstimateStatus;

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("Estimate {estimate_id} not found")]
    NotFound { estimate_id: i64 },

    #[error("Line item {line_item_id} not found")]
    LineItemNotFound { line_item_id: i64 },

    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: i64 },

    #[error("Customer {customer_id} not found")]
    CustomerNotFound { customer_id: i64 },

    /// Draft-exit guard.
    #[error("You must add at least one product to estimate {estimate_id} before submitting")]
    NoLineItems { estimate_id: i64 },

    #[error("Estimate {estimate_id} is {status} and can no longer be edited")]
    NotEditable {
        estimate_id: i64,
        status: EstimateStatus,
    },

    #[error("Estimate {estimate_id} changed status concurrently; reload and retry")]
    StatusChanged { estimate_id: i64 },

    /// Leaving Draft must issue a signing link, which plain advancing skips.
    #[error("Estimate {estimate_id} must be submitted by issuing its invoice")]
    InvoiceRequired { estimate_id: i64 },

    #[error("Estimate {estimate_id} has an outstanding invoice link")]
    OutstandingInvoice { estimate_id: i64 },

    #[error("The quantity must be between 1 and 10000 (got {quantity})")]
    InvalidQuantity { quantity: i64 },

    #[error("Product {product_id} must clear the doorway width and height by one inch")]
    DoesNotFitDoorway { product_id: i64 },

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl EstimateError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EstimateError::NotFound { .. }
            | EstimateError::LineItemNotFound { .. }
            | EstimateError::ProductNotFound { .. }
            | EstimateError::CustomerNotFound { .. } => ErrorClass::NotFound,
            EstimateError::NoLineItems { .. }
            | EstimateError::InvalidQuantity { .. }
            | EstimateError::DoesNotFitDoorway { .. }
            | EstimateError::MalformedRequest(_) => ErrorClass::Validation,
            EstimateError::NotEditable { .. }
            | EstimateError::StatusChanged { .. }
            | EstimateError::InvoiceRequired { .. }
            | EstimateError::OutstandingInvoice { .. } => ErrorClass::Conflict,
            EstimateError::Database(_) => ErrorClass::Dependency,
        }
    }

    /// Status code for the outer request layer.
    ///
    /// The Draft-exit guard is a validation failure for the user but is
    /// signalled as 409, since the request conflicts with the estimate's
    /// current contents rather than being malformed.
    pub fn status_code(&self) -> u16 {
        match self {
            EstimateError::NoLineItems { .. } => 409,
            other => other.class().status_code(),
        }
    }

    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::Dependency => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}
