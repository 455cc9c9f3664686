//! Signature upload constraints.

use super::error::InvoiceError;

/// Multipart form field carrying the signature image.
pub const SIGNATURE_FIELD: &str = "signature";

/// Largest accepted signature, in bytes (512 KiB).
pub const DEFAULT_MAX_SIGNATURE_BYTES: usize = 512 * 1024;

pub const DEFAULT_SIGNATURE_CONTENT_TYPE: &str = "image/png";

/// An uploaded signature as received from the client.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureUpload {
    pub content: Vec<u8>,
    /// Declared content type, taken verbatim from the request.
    pub content_type: String,
}

impl SignatureUpload {
    pub fn new(content: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            content,
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl std::fmt::Debug for SignatureUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureUpload")
            .field("size", &self.content.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Size ceiling and required content type for signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: usize,
    content_type: String,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_SIGNATURE_BYTES,
            content_type: DEFAULT_SIGNATURE_CONTENT_TYPE.to_string(),
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: usize, content_type: impl Into<String>) -> Self {
        Self {
            max_bytes,
            content_type: content_type.into(),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Checks an upload before anything is written to storage.
    ///
    /// Size is checked first, then the declared type, which must match
    /// exactly. A body of exactly `max_bytes` is accepted.
    pub fn validate(&self, upload: &SignatureUpload) -> Result<(), InvoiceError> {
        if upload.size() > self.max_bytes {
            return Err(InvoiceError::PayloadTooLarge {
                size: upload.size(),
                limit: self.max_bytes,
            });
        }
        if upload.content_type != self.content_type {
            return Err(InvoiceError::UnsupportedMediaType {
                content_type: upload.content_type.clone(),
                expected: self.content_type.clone(),
            });
        }
        if upload.content.is_empty() {
            return Err(InvoiceError::EmptyUpload);
        }
        Ok(())
    }
}
