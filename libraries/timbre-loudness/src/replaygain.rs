//! ReplayGain 2.0 calculation
//!
//! ReplayGain 2.0 is based on EBU R128 loudness measurement and uses
//! -18 LUFS as the reference level.
//!
//! # Gain Calculation
//!
//! - Track Gain = Reference Level (-18 LUFS) - Track Integrated Loudness
//! - Album Gain = Reference Level (-18 LUFS) - Loudness of all tracks gated together
//!
//! Album loudness is measured over the combined gating blocks of every
//! member rather than averaged from track gains, so a short loud track and a
//! long quiet one weigh in proportion to their length.

use crate::analyzer::TrackLoudness;
use crate::error::{LoudnessError, Result};
use crate::{LOUDNESS_FLOOR_LUFS, REPLAYGAIN_REFERENCE_LUFS};
use ebur128::EbuR128;
use timbre_core::{AlbumAnalysis, TrackAnalysis};

/// Calculator for ReplayGain values
#[derive(Debug, Clone, Copy)]
pub struct ReplayGainCalculator {
    /// Reference loudness level (default: -18 LUFS for RG2)
    reference_lufs: f64,
}

impl Default for ReplayGainCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayGainCalculator {
    /// Create a new calculator with the default reference level (-18 LUFS)
    pub fn new() -> Self {
        Self {
            reference_lufs: REPLAYGAIN_REFERENCE_LUFS,
        }
    }

    /// Create a calculator with a custom reference level
    pub fn with_reference(reference_lufs: f64) -> Self {
        Self { reference_lufs }
    }

    /// Reference level in LUFS
    pub fn reference_lufs(&self) -> f64 {
        self.reference_lufs
    }

    /// Gain that brings `loudness_lufs` to the reference level
    ///
    /// Loudness below the floor (including `-inf` for silence) is treated as
    /// the floor, so the result is always finite.
    pub fn gain_for_loudness(&self, loudness_lufs: f64) -> f64 {
        let loudness = if loudness_lufs.is_finite() {
            loudness_lufs.max(LOUDNESS_FLOOR_LUFS)
        } else {
            LOUDNESS_FLOOR_LUFS
        };
        self.reference_lufs - loudness
    }

    /// Track peak and gain
    pub fn track(&self, loudness: &TrackLoudness) -> TrackAnalysis {
        TrackAnalysis {
            peak: loudness.peak,
            gain_db: self.gain_for_loudness(loudness.integrated_lufs),
        }
    }

    /// Album peak and gain over every member
    ///
    /// The peak is the maximum member peak.
    ///
    /// # Errors
    /// `NoTracks` if `tracks` is empty
    pub fn album(&self, tracks: &[&TrackLoudness]) -> Result<AlbumAnalysis> {
        if tracks.is_empty() {
            return Err(LoudnessError::NoTracks);
        }

        let peak = tracks.iter().map(|t| t.peak).fold(0.0_f64, f64::max);

        let measured: Vec<&EbuR128> = tracks
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.state())
            .collect();
        let loudness = if measured.is_empty() {
            f64::NEG_INFINITY
        } else {
            EbuR128::loudness_global_multiple(measured.into_iter())?
        };
        // Members too short for any gating block still have a loudness
        let loudness = if loudness.is_finite() {
            loudness
        } else {
            combined_short_loudness(tracks)
        };

        Ok(AlbumAnalysis {
            peak,
            gain_db: self.gain_for_loudness(loudness),
        })
    }
}

/// Frame-weighted mean energy of the members' own loudness
fn combined_short_loudness(tracks: &[&TrackLoudness]) -> f64 {
    let (energy, frames) = tracks
        .iter()
        .filter(|t| t.integrated_lufs.is_finite())
        .fold((0.0_f64, 0_u64), |(energy, frames), t| {
            let power = 10_f64.powf((t.integrated_lufs + 0.691) / 10.0);
            (energy + power * t.frames as f64, frames + t.frames)
        });

    if frames == 0 {
        f64::NEG_INFINITY
    } else {
        10.0 * (energy / frames as f64).log10() - 0.691
    }
}
