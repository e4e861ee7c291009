//! Error types for loudness analysis

use thiserror::Error;
use timbre_core::TimbreError;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness analysis
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1-8)")]
    InvalidChannelCount(u16),

    /// EBU R128 analysis error
    #[error("EBU R128 analysis failed: {0}")]
    AnalysisError(String),

    /// Album aggregation received no members
    #[error("No tracks provided for album analysis")]
    NoTracks,

    /// A measurement handed back for aggregation was not produced here
    #[error("Measurement was not produced by the ReplayGain analyzer")]
    ForeignMeasurement,

    /// Reading samples from the source failed
    #[error(transparent)]
    Source(#[from] TimbreError),
}

impl From<ebur128::Error> for LoudnessError {
    fn from(err: ebur128::Error) -> Self {
        Self::AnalysisError(format!("{:?}", err))
    }
}

impl From<LoudnessError> for TimbreError {
    fn from(err: LoudnessError) -> Self {
        match err {
            LoudnessError::Source(inner) => inner,
            LoudnessError::ForeignMeasurement => Self::ProviderContract(err.to_string()),
            LoudnessError::NoTracks => Self::InvalidArgument(err.to_string()),
            other => Self::Analysis(other.to_string()),
        }
    }
}
