//! Invoice signing links: token minting, resolution and redemption.

pub mod error;
pub mod link;
pub mod signing;
pub mod token;
pub mod upload;

pub use error::{InvoiceError, INVALID_LINK_MESSAGE};
pub use signing::{
    InvoiceService, InvoiceSettings, InvoiceView, IssuedInvoice, SignedInvoice,
    DEFAULT_TOKEN_TTL_HOURS,
};
pub use token::{GeneratedToken, TokenHash, TOKEN_BYTES};
pub use upload::{SignatureUpload, UploadPolicy, SIGNATURE_FIELD};
