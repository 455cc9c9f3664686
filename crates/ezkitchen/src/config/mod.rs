pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, SUPPORTED_VERSION};
pub use schema::{
    AppConfig, DatabaseConfig, InvoiceConfig, LoggingConfig, MailerConfig, MailerKind,
    PricingConfig, StorageConfig,
};
