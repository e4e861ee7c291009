/// Host configuration errors
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file or environment could not be read or parsed
    #[error("Configuration error: {0}")]
    Load(String),

    /// A value parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
