use std::path::PathBuf;
use thiserror::Error;

use crate::estimate::EstimateError;
use crate::invoice::InvoiceError;
use crate::mailer::MailerError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum EzKitchenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Mailer error: {0}")]
    Mailer(#[from] MailerError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

/// How a failure should be surfaced to whoever called into the core.
///
/// The outer request layer maps each class to a status code; dependency
/// failures are never described to the client beyond a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Client-caused and recoverable by the client.
    Validation,
    /// Missing record, or a token that is unknown, expired, used or revoked.
    NotFound,
    /// Already signed, or a lifecycle guard refused the request.
    Conflict,
    PayloadTooLarge,
    UnsupportedMediaType,
    /// Database, object storage or mail delivery failed.
    Dependency,
}

impl ErrorClass {
    /// HTTP status code conventionally used for this class.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::Validation => 422,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::PayloadTooLarge => 413,
            ErrorClass::UnsupportedMediaType => 415,
            ErrorClass::Dependency => 500,
        }
    }
}

/// Message shown to end users for any dependency failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid labor rule for category '{category}': {reason}")]
    InvalidLaborRule { category: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{path}': {source}")]
    WriteObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read object '{path}': {source}")]
    ReadObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object metadata for '{key}' is corrupt: {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, EzKitchenError>;
