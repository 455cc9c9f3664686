use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::db;
use crate::error::ConfigError;
use crate::estimate::pricing::{
    default_labor_rules, LaborRule, PricingPolicy, DEFAULT_BASE_LABOR_CENTS, DEFAULT_TAX_DIVISOR,
};
use crate::invoice::signing::{InvoiceSettings, DEFAULT_TOKEN_TTL_HOURS};
use crate::invoice::upload::{
    UploadPolicy, DEFAULT_MAX_SIGNATURE_BYTES, DEFAULT_SIGNATURE_CONTENT_TYPE,
};
use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    pub invoice: InvoiceConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ezkitchen"))
        .unwrap_or_else(|| PathBuf::from(".ezkitchen"))
}

fn default_database_path() -> String {
    db::default_database_path()
        .unwrap_or_else(|| data_dir().join("data").join("ezkitchen.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_storage_root() -> String {
    data_dir().join("objects").to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailerKind {
    /// Writes the mail to the log instead of sending it.
    #[default]
    Log,
    /// POSTs the mail to an HTTP relay.
    Webhook,
}

fn default_from_address() -> String {
    "estimates@ezkitchen.local".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    #[serde(default)]
    pub kind: MailerKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_from_address")]
    pub from: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub api_key_env_var: Option<String>,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            kind: MailerKind::Log,
            endpoint: None,
            from: default_from_address(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: None,
        }
    }
}

impl MailerConfig {
    pub fn api_key_source(&self) -> SecretSource {
        SecretSource {
            value: self.api_key.clone(),
            file: self.api_key_file.clone(),
            env_var: self.api_key_env_var.clone(),
        }
    }
}

fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}

fn default_max_signature_bytes() -> usize {
    DEFAULT_MAX_SIGNATURE_BYTES
}

fn default_signature_content_type() -> String {
    DEFAULT_SIGNATURE_CONTENT_TYPE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceConfig {
    /// Public origin the signing links point at, e.g. `https://ezkitchen.example`.
    pub base_url: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_max_signature_bytes")]
    pub max_signature_bytes: usize,
    #[serde(default = "default_signature_content_type")]
    pub signature_content_type: String,
}

impl InvoiceConfig {
    pub fn settings(&self) -> InvoiceSettings {
        InvoiceSettings {
            base_url: self.base_url.clone(),
            token_ttl: chrono::Duration::hours(self.token_ttl_hours),
            upload: UploadPolicy::new(self.max_signature_bytes, self.signature_content_type.clone()),
        }
    }
}

fn default_base_labor_cents() -> i64 {
    DEFAULT_BASE_LABOR_CENTS
}

fn default_tax_divisor() -> i64 {
    DEFAULT_TAX_DIVISOR
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_base_labor_cents")]
    pub base_labor_cents: i64,
    #[serde(default = "default_tax_divisor")]
    pub tax_divisor: i64,
    #[serde(default = "default_labor_rules")]
    pub labor_rules: BTreeMap<String, LaborRule>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_labor_cents: DEFAULT_BASE_LABOR_CENTS,
            tax_divisor: DEFAULT_TAX_DIVISOR,
            labor_rules: default_labor_rules(),
        }
    }
}

impl PricingConfig {
    pub fn policy(&self) -> Result<PricingPolicy, ConfigError> {
        PricingPolicy::new(
            self.base_labor_cents,
            self.tax_divisor,
            self.labor_rules.clone(),
        )
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive; `RUST_LOG` overrides it when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"version": "1.0", "invoice": {"base_url": "https://ez.example"}}"#,
        )
        .unwrap();
        assert_eq!(config.invoice.token_ttl_hours, 72);
        assert_eq!(config.invoice.max_signature_bytes, 512 * 1024);
        assert_eq!(config.invoice.signature_content_type, "image/png");
        assert_eq!(config.pricing.base_labor_cents, 30_000);
        assert_eq!(config.pricing.tax_divisor, 6);
        assert_eq!(config.pricing.labor_rules.len(), 5);
        assert_eq!(config.mailer.kind, MailerKind::Log);
        assert_eq!(config.logging.level, "info");
        assert!(config.database.path.ends_with("ezkitchen.db"));

        let settings = config.invoice.settings();
        assert_eq!(settings.token_ttl, chrono::Duration::hours(72));
        assert_eq!(settings.upload.max_bytes(), 512 * 1024);
        assert_eq!(config.pricing.policy().unwrap(), PricingPolicy::default());
    }

    #[test]
    fn test_labor_rules_deserialize() {
        let pricing: PricingConfig = serde_json::from_str(
            r#"{"labor_rules": {"Lighting": {"kind": "per_unit", "cents": 1200}}}"#,
        )
        .unwrap();
        assert_eq!(
            pricing.labor_rules.get("Lighting"),
            Some(&LaborRule::PerUnit { cents: 1200 })
        );
        assert_eq!(pricing.tax_divisor, 6);
    }

    #[test]
    fn test_api_key_source() {
        let mailer: MailerConfig = serde_json::from_str(
            r#"{"kind": "webhook", "endpoint": "https://relay.example/send", "api_key_env_var": "RELAY_KEY"}"#,
        )
        .unwrap();
        let source = mailer.api_key_source();
        assert_eq!(source.env_var.as_deref(), Some("RELAY_KEY"));
        assert!(source.is_configured());
    }
}
