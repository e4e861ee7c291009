/// Codec-specific errors
use std::io;
use thiserror::Error;
use timbre_core::TimbreError;

/// Result type alias using `CodecError`
pub type Result<T> = std::result::Result<T, CodecError>;

/// Codec error types
#[derive(Error, Debug)]
pub enum CodecError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Container or codec not supported
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed stream content
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Writing the output failed
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Tag reading or writing failed
    #[error("Tag error: {0}")]
    TagError(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Sample source or metadata error
    #[error(transparent)]
    Core(#[from] TimbreError),
}

impl From<symphonia::core::errors::Error> for CodecError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error;
        match err {
            Error::IoError(e) => Self::Io(e),
            Error::Unsupported(what) => Self::UnsupportedFormat(what.to_string()),
            other => Self::DecodeError(other.to_string()),
        }
    }
}

impl From<hound::Error> for CodecError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e),
            other => Self::EncodeError(other.to_string()),
        }
    }
}

impl From<lofty::error::LoftyError> for CodecError {
    fn from(err: lofty::error::LoftyError) -> Self {
        Self::TagError(err.to_string())
    }
}

impl From<CodecError> for TimbreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::FileNotFound(path) => {
                Self::Io(io::Error::new(io::ErrorKind::NotFound, format!("File not found: {}", path)))
            }
            CodecError::UnsupportedFormat(what) => Self::UnsupportedFormat(what),
            CodecError::DecodeError(msg)
            | CodecError::EncodeError(msg)
            | CodecError::TagError(msg) => Self::InvalidFormat(msg),
            CodecError::Io(e) => Self::Io(e),
            CodecError::Core(e) => e,
        }
    }
}
