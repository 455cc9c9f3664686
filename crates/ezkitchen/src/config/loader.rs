use std::path::Path;

use crate::config::schema::{AppConfig, MailerKind};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub const SUPPORTED_VERSION: &str = "1.0";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: AppConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.version != SUPPORTED_VERSION {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    let base_url = config.invoice.base_url.trim();
    if base_url.is_empty() {
        return Err(invalid("invoice.base_url must not be empty"));
    }
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(invalid(format!(
            "invoice.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }
    if base_url.ends_with('/') {
        return Err(invalid("invoice.base_url must not end with '/'"));
    }

    if config.invoice.token_ttl_hours <= 0 {
        return Err(invalid(format!(
            "invoice.token_ttl_hours must be positive, got {}",
            config.invoice.token_ttl_hours
        )));
    }
    if config.invoice.max_signature_bytes == 0 {
        return Err(invalid("invoice.max_signature_bytes must be positive"));
    }
    if config.invoice.signature_content_type.trim().is_empty() {
        return Err(invalid("invoice.signature_content_type must not be empty"));
    }

    if config.mailer.kind == MailerKind::Webhook
        && config
            .mailer
            .endpoint
            .as_deref()
            .is_none_or(|endpoint| endpoint.trim().is_empty())
    {
        return Err(invalid("mailer.endpoint is required for the webhook mailer"));
    }

    // Labor rules and the divisor are checked where the policy is built.
    config.pricing.policy()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::LaborRule;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
    {
        "version": "1.0",
        "invoice": { "base_url": "https://ezkitchen.example" }
    }
    "#;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.invoice.base_url, "https://ezkitchen.example");
        assert_eq!(config.invoice.token_ttl_hours, 72);
        assert_eq!(config.mailer.kind, MailerKind::Log);
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database": { "path": "/var/lib/ezkitchen/ezkitchen.db" },
            "storage": { "root": "/var/lib/ezkitchen/objects" },
            "mailer": {
                "kind": "webhook",
                "endpoint": "https://relay.example/send",
                "from": "estimates@ezkitchen.example",
                "api_key_env_var": "EZK_RELAY_KEY"
            },
            "invoice": {
                "base_url": "https://ezkitchen.example",
                "token_ttl_hours": 48,
                "max_signature_bytes": 262144
            },
            "pricing": {
                "base_labor_cents": 25000,
                "tax_divisor": 8,
                "labor_rules": {
                    "Appliances": { "kind": "per_line", "cents": 12000 }
                }
            },
            "logging": { "level": "debug", "json": true }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.database.path, "/var/lib/ezkitchen/ezkitchen.db");
        assert_eq!(config.mailer.kind, MailerKind::Webhook);
        assert_eq!(config.invoice.token_ttl_hours, 48);
        assert_eq!(config.invoice.signature_content_type, "image/png");
        assert_eq!(config.pricing.tax_divisor, 8);
        assert_eq!(
            config.pricing.labor_rules.get("Appliances"),
            Some(&LaborRule::PerLine { cents: 12_000 })
        );
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.version, "1.0");

        let missing = load_config("/nonexistent/ezkitchen.json");
        assert!(matches!(missing, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(
            r#"{"version": "2.0", "invoice": {"base_url": "https://ez.example"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "invoice": {"base_url": "https://ez.example"}, "workers": 4}"#,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "invoice": {"base_url": "https://ez.example"}, "pricing": {"tax_divisor": 0}}"#,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_base_url_rules() {
        let trailing = load_config_from_str(
            r#"{"version": "1.0", "invoice": {"base_url": "https://ez.example/"}}"#,
        );
        assert!(matches!(trailing, Err(ConfigError::Validation { .. })));

        let scheme =
            load_config_from_str(r#"{"version": "1.0", "invoice": {"base_url": "ez.example"}}"#);
        assert!(matches!(scheme, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_webhook_requires_endpoint() {
        let result = load_config_from_str(
            r#"{"version": "1.0", "invoice": {"base_url": "https://ez.example"}, "mailer": {"kind": "webhook"}}"#,
        );
        match result {
            Err(ConfigError::Validation { message }) => assert!(message.contains("endpoint")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
