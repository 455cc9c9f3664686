pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod estimate;
pub mod invoice;
pub mod mailer;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod telemetry;

pub use app::{Application, Progression};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, load_config_from_str, AppConfig};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, ErrorClass, EzKitchenError, Result, StorageError};
pub use estimate::{
    EstimateError, EstimateService, EstimateStatus, EstimateTotals, PricedEstimate, PricingPolicy,
    Transition,
};
pub use invoice::{
    InvoiceError, InvoiceService, InvoiceSettings, InvoiceView, IssuedInvoice, SignatureUpload,
    SignedInvoice,
};
pub use mailer::{InvoiceLinkData, Mailer, MailerError};
pub use secrets::{resolve_secret, SecretError, SecretSource};
pub use storage::{ObjectStore, StoredObject};
pub use telemetry::init_logging;
