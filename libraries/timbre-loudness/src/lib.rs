//! Loudness analysis for Timbre
//!
//! This crate provides:
//! - EBU R128 loudness measurement with simple or interpolated (true) peaks
//! - ReplayGain 2.0 calculation (track and album gain)
//! - Gain application with clipping prevention
//! - The `ReplayGain` analyzer provider
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ SampleSource │ ──► │ LoudnessMeter │ ──► │ TrackLoudness │ ──► track gain/peak
//! └──────────────┘     └───────────────┘     └───────────────┘
//!                                                    │ (every member)
//!                                                    ▼
//!                                            ┌──────────────┐
//!                                            │ album gain   │
//!                                            └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use timbre_loudness::{measure_source, PeakAnalysis, ReplayGainCalculator};
//!
//! let loudness = measure_source(&mut source, PeakAnalysis::Simple)?;
//! let track = ReplayGainCalculator::new().track(&loudness);
//! println!("Track gain: {:.2} dB, peak {:.6}", track.gain_db, track.peak);
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod error;
mod gain;
mod provider;
mod replaygain;

pub use analyzer::{measure_source, LoudnessMeter, PeakAnalysis, TrackLoudness, CHUNK_FRAMES};
pub use error::{LoudnessError, Result};
pub use gain::{apply_gain, db_to_linear, linear_to_db, max_safe_gain};
pub use provider::ReplayGainAnalyzer;
pub use replaygain::ReplayGainCalculator;

/// ReplayGain 2.0 reference loudness level (-18 LUFS)
pub const REPLAYGAIN_REFERENCE_LUFS: f64 = -18.0;

/// Lowest loudness used for gain calculation (BS.1770 absolute gate)
///
/// Silent and empty input is measured at this level, giving a gain of 52 dB.
pub const LOUDNESS_FLOOR_LUFS: f64 = -70.0;
