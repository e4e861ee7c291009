//! Gain application with clipping prevention

use tracing::debug;

/// Convert dB to a linear amplitude factor
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear amplitude factor to dB
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Largest gain in dB that keeps `peak` at or below full scale
pub fn max_safe_gain(peak: f64) -> f64 {
    if peak > 0.0 {
        -linear_to_db(peak)
    } else {
        f64::INFINITY
    }
}

/// Scale `samples` by `gain_db`, reduced as needed so nothing clips
///
/// `peak` is the known peak of the material (for example the stored
/// ReplayGain peak); when `None`, the largest absolute sample is used.
/// Returns the gain actually applied, in dB.
pub fn apply_gain(samples: &mut [f32], gain_db: f64, peak: Option<f64>) -> f64 {
    let peak = peak.unwrap_or_else(|| {
        samples
            .iter()
            .map(|s| f64::from(s.abs()))
            .fold(0.0_f64, f64::max)
    });

    let applied = gain_db.min(max_safe_gain(peak));
    if applied < gain_db {
        debug!(
            "Limiting gain from {:.2} dB to {:.2} dB for peak {:.6}",
            gain_db, applied, peak
        );
    }

    let factor = db_to_linear(applied) as f32;
    for sample in samples.iter_mut() {
        *sample = (*sample * factor).clamp(-1.0, 1.0);
    }
    applied
}
