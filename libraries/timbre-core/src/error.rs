/// Core error types for Timbre
use crate::types::MetadataField;
use thiserror::Error;

/// Result type alias using `TimbreError`
pub type Result<T> = std::result::Result<T, TimbreError>;

/// Core error type for Timbre
#[derive(Error, Debug)]
pub enum TimbreError {
    /// A required argument was missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A structured metadata field failed validation
    #[error("Invalid value for {field}: {value:?}")]
    MetadataInvalid {
        /// The field being assigned
        field: MetadataField,
        /// The rejected input
        value: String,
    },

    /// No provider of the requested kind is registered under this name
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A provider with this name is already registered
    #[error("Duplicate provider: {0}")]
    DuplicateProvider(String),

    /// A settings key is not part of the provider's schema
    #[error("Unsupported setting: {0}")]
    UnsupportedSetting(String),

    /// A settings value has the wrong type or is out of range
    #[error("Invalid value for setting {key}: {value}")]
    InvalidSettingValue {
        /// The settings key
        key: String,
        /// The rejected value, rendered for display
        value: String,
    },

    /// The file or stream format is not supported by the provider
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file or stream content is malformed
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A provider broke its contract with the orchestrator
    #[error("Provider contract violation: {0}")]
    ProviderContract(String),

    /// Loudness or peak analysis failed
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Work was not started because the caller cancelled it
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl TimbreError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a metadata validation error
    pub fn metadata_invalid(field: MetadataField, value: impl Into<String>) -> Self {
        Self::MetadataInvalid {
            field,
            value: value.into(),
        }
    }

    /// Create an invalid setting value error
    pub fn invalid_setting_value(key: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidSettingValue {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create an invalid format error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}
