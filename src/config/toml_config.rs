use crate::core::checkout::CheckoutSettings;
use crate::domain::model::{DeliveryMethod, Price};
use crate::utils::error::{CheckoutError, Result};
use crate::utils::validation::{
    validate_currency_code, validate_non_negative, validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub checkout: ShopConfig,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethodConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub name: String,
    pub default_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethodConfig {
    pub name: String,
    /// Minor units of the default currency.
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
    #[serde(default = "default_orders_dir")]
    pub orders_dir: String,
}

fn default_session_dir() -> String {
    "./sessions".to_string()
}

fn default_orders_dir() -> String {
    "./orders".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            orders_dir: default_orders_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl CheckoutConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| CheckoutError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CheckoutError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CheckoutError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_currency_code("checkout.default_currency", &self.checkout.default_currency)?;

        if self.shipping_methods.is_empty() {
            return Err(CheckoutError::ConfigError {
                message: "At least one [[shipping_methods]] entry is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for method in &self.shipping_methods {
            if method.name.trim().is_empty() {
                return Err(CheckoutError::InvalidConfigValueError {
                    field: "shipping_methods.name".to_string(),
                    value: method.name.clone(),
                    reason: "Shipping method name cannot be empty".to_string(),
                });
            }
            if !seen.insert(method.name.as_str()) {
                return Err(CheckoutError::InvalidConfigValueError {
                    field: "shipping_methods.name".to_string(),
                    value: method.name.clone(),
                    reason: "Shipping method names must be unique".to_string(),
                });
            }
            validate_non_negative("shipping_methods.price", method.price)?;
        }

        validate_path("storage.session_dir", &self.storage.session_dir)?;
        validate_path("storage.orders_dir", &self.storage.orders_dir)?;

        Ok(())
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        let currency = &self.checkout.default_currency;
        CheckoutSettings {
            default_currency: currency.clone(),
            shipping_methods: self
                .shipping_methods
                .iter()
                .map(|method| DeliveryMethod {
                    name: method.name.clone(),
                    price: Price::new(method.price, currency.clone()),
                })
                .collect(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|logging| logging.json)
            .unwrap_or(false)
    }
}

impl Validate for CheckoutConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[checkout]
name = "Demo Store"
default_currency = "USD"

[[shipping_methods]]
name = "dhl"
price = 1000

[[shipping_methods]]
name = "ups"
price = 1500
description = "Two-day delivery"

[storage]
session_dir = "/tmp/sessions"
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = CheckoutConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(config.checkout.name, "Demo Store");
        assert_eq!(config.shipping_methods.len(), 2);
        assert_eq!(config.storage.session_dir, "/tmp/sessions");
        assert_eq!(config.storage.orders_dir, "./orders");
        assert_eq!(config.log_level(), "info");
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());

        let settings = config.checkout_settings();
        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.shipping_methods[1].price, Price::new(1500, "USD"));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("CHECKOUT_TEST_CURRENCY", "EUR");
        let content = BASIC.replace("\"USD\"", "\"${CHECKOUT_TEST_CURRENCY}\"");
        let config = CheckoutConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.checkout.default_currency, "EUR");

        let content = BASIC.replace("\"USD\"", "\"${CHECKOUT_TEST_UNSET_VARIABLE}\"");
        let config = CheckoutConfig::from_toml_str(&content).unwrap();
        assert_eq!(
            config.checkout.default_currency,
            "${CHECKOUT_TEST_UNSET_VARIABLE}"
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_methods() {
        let content = BASIC.replace("name = \"ups\"", "name = \"dhl\"");
        let config = CheckoutConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(CheckoutError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_requires_shipping_methods() {
        let config = CheckoutConfig::from_toml_str(
            "[checkout]\nname = \"x\"\ndefault_currency = \"USD\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(CheckoutError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            CheckoutConfig::from_toml_str("[checkout"),
            Err(CheckoutError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", BASIC).unwrap();
        let config = CheckoutConfig::from_file(file.path()).unwrap();
        assert_eq!(config.checkout.default_currency, "USD");

        assert!(CheckoutConfig::from_file("/definitely/not/here.toml").is_err());
    }
}
