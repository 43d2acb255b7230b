use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrataError {
    #[error("Setting '{key}' is required")]
    MissingRequired { key: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),
}
