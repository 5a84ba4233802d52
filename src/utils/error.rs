use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("Price overflow: amount in {currency} is too large")]
    PriceOverflow { currency: String },

    #[error("Unknown checkout step: {key}")]
    UnknownStep { key: String },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    System,
    Configuration,
    Input,
    Pricing,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CheckoutError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CheckoutError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckoutError::IoError(_) => ErrorCategory::System,
            CheckoutError::SerializationError(_) | CheckoutError::PersistenceError { .. } => {
                ErrorCategory::Storage
            }
            CheckoutError::ConfigError { .. } | CheckoutError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            CheckoutError::ValidationError { .. } | CheckoutError::UnknownStep { .. } => {
                ErrorCategory::Input
            }
            CheckoutError::CurrencyMismatch { .. } | CheckoutError::PriceOverflow { .. } => {
                ErrorCategory::Pricing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Pricing => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CheckoutError::IoError(_) => {
                "Check that the session and order directories exist and are writable".to_string()
            }
            CheckoutError::SerializationError(_) => {
                "The stored session or order file is corrupt; remove it and start over".to_string()
            }
            CheckoutError::ConfigError { .. } | CheckoutError::InvalidConfigValueError { .. } => {
                "Fix the checkout configuration file and try again".to_string()
            }
            CheckoutError::ValidationError { field, .. } => {
                format!("Correct the '{}' field and submit the step again", field)
            }
            CheckoutError::CurrencyMismatch { .. } => {
                "All cart prices and shipping methods must use the default currency".to_string()
            }
            CheckoutError::PriceOverflow { .. } => {
                "Reduce the quantity of the affected cart line or clear the cart".to_string()
            }
            CheckoutError::UnknownStep { .. } => {
                "List the available steps with the `steps` command".to_string()
            }
            CheckoutError::PersistenceError { .. } => {
                "The order could not be stored; retry once the order store is reachable"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckoutError::ValidationError { field, message } => {
                format!("Please check '{}': {}", field, message)
            }
            CheckoutError::UnknownStep { key } => {
                format!("There is no checkout step called '{}'", key)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
