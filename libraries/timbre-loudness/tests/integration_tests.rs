//! Integration tests for timbre-loudness
//!
//! Tests include:
//! - Property-based tests with proptest
//! - Edge case testing (empty, silent, clipped input)
//! - Analyzer provider round trips through measure and aggregate

use proptest::prelude::*;
use timbre_core::{
    AudioAnalyzer, AudioFormat, MemorySampleSource, SampleRate, ValidatedSettings,
};
use timbre_loudness::{
    measure_source, PeakAnalysis, ReplayGainAnalyzer, ReplayGainCalculator, LOUDNESS_FLOOR_LUFS,
    REPLAYGAIN_REFERENCE_LUFS,
};

// ========== Helper Functions ==========

/// Generate a sine wave at specified amplitude and frequency
fn generate_sine(
    sample_rate: u32,
    channels: u16,
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
) -> Vec<f32> {
    let num_frames = (sample_rate as f32 * duration_secs) as usize;
    let mut samples = Vec::with_capacity(num_frames * usize::from(channels));

    for i in 0..num_frames {
        let t = i as f32 / sample_rate as f32;
        let sample = amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin();
        for _ in 0..channels {
            samples.push(sample);
        }
    }

    samples
}

fn source(samples: Vec<f32>, sample_rate: u32, channels: u16) -> MemorySampleSource {
    MemorySampleSource::new(samples, AudioFormat::new(SampleRate::new(sample_rate), channels, 16))
        .unwrap()
}

// ========== Property Tests ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: the interpolated peak is never below the simple peak
    #[test]
    fn interpolated_peak_at_least_simple(
        samples in prop::collection::vec(-1.0f32..=1.0, 0..4000),
        stereo in any::<bool>(),
    ) {
        let channels: u16 = if stereo { 2 } else { 1 };
        let mut samples = samples;
        samples.truncate(samples.len() - samples.len() % usize::from(channels));

        let simple = measure_source(&mut source(samples.clone(), 44_100, channels), PeakAnalysis::Simple).unwrap();
        let interpolated = measure_source(&mut source(samples, 44_100, channels), PeakAnalysis::Interpolated).unwrap();

        prop_assert!(interpolated.peak >= simple.peak);
    }

    /// Property: the simple peak equals the largest absolute sample
    #[test]
    fn simple_peak_is_max_abs(samples in prop::collection::vec(-1.0f32..=1.0, 1..4000)) {
        let expected = samples.iter().map(|s| f64::from(s.abs())).fold(0.0, f64::max);
        let loudness = measure_source(&mut source(samples, 48_000, 1), PeakAnalysis::Simple).unwrap();
        prop_assert!((loudness.peak - expected).abs() < 1e-6);
    }

    /// Property: gains are finite and never exceed the floor gain
    #[test]
    fn gain_is_finite_and_bounded(amplitude in 0.0f32..1.0) {
        let samples = generate_sine(44_100, 1, 1000.0, amplitude, 0.5);
        let loudness = measure_source(&mut source(samples, 44_100, 1), PeakAnalysis::Simple).unwrap();
        let gain = ReplayGainCalculator::new().track(&loudness).gain_db;

        prop_assert!(gain.is_finite());
        prop_assert!(gain <= REPLAYGAIN_REFERENCE_LUFS - LOUDNESS_FLOOR_LUFS);
    }
}

// ========== Edge Cases ==========

#[test]
fn empty_buffer_has_zero_peak_and_floor_gain() {
    for mode in [PeakAnalysis::Simple, PeakAnalysis::Interpolated] {
        let loudness = measure_source(&mut source(Vec::new(), 44_100, 2), mode).unwrap();
        let track = ReplayGainCalculator::new().track(&loudness);
        assert_eq!(track.peak, 0.0);
        assert_eq!(track.gain_db, 52.0);
    }
}

#[test]
fn silence_has_floor_gain() {
    let loudness = measure_source(&mut source(vec![0.0; 88_200], 44_100, 1), PeakAnalysis::Simple).unwrap();
    let track = ReplayGainCalculator::new().track(&loudness);
    assert_eq!(track.peak, 0.0);
    assert_eq!(track.gain_db, 52.0);
}

#[test]
fn short_tone_is_not_treated_as_silence() {
    let analyzer = ReplayGainAnalyzer::new();
    let mut clip = source(generate_sine(44_100, 2, 1000.0, 0.9, 0.3), 44_100, 2);
    let measurement = analyzer.measure(&mut clip, &ValidatedSettings::empty()).unwrap();
    assert!(measurement.track.gain_db < 20.0, "gain {}", measurement.track.gain_db);
    assert!(measurement.track.peak > 0.85);
}

#[test]
fn interpolated_peak_exceeds_full_scale_on_clipped_material() {
    // A quarter-rate sine sampled at 45 degrees never hits its true crest
    let rate = 44_100;
    let amplitude = 1.0_f32 / std::f32::consts::FRAC_1_SQRT_2;
    let samples: Vec<f32> = (0..rate)
        .map(|i| {
            let phase = std::f32::consts::FRAC_PI_4 + std::f32::consts::FRAC_PI_2 * i as f32;
            (amplitude * phase.sin()).clamp(-1.0, 1.0)
        })
        .collect();

    let simple = measure_source(&mut source(samples.clone(), rate, 1), PeakAnalysis::Simple).unwrap();
    let interpolated = measure_source(&mut source(samples, rate, 1), PeakAnalysis::Interpolated).unwrap();

    assert!(simple.peak <= 1.0);
    assert!(interpolated.peak > 1.0, "true peak {}", interpolated.peak);
}

#[test]
fn mono_measured_as_dual_mono() {
    let mono = generate_sine(44_100, 1, 1000.0, 0.5, 3.0);
    let stereo = generate_sine(44_100, 2, 1000.0, 0.5, 3.0);

    let mono = measure_source(&mut source(mono, 44_100, 1), PeakAnalysis::Simple).unwrap();
    let stereo = measure_source(&mut source(stereo, 44_100, 2), PeakAnalysis::Simple).unwrap();

    assert!((mono.integrated_lufs - stereo.integrated_lufs).abs() < 0.1);
}

#[test]
fn mismatched_rates_in_one_album() {
    let calc = ReplayGainCalculator::new();
    let a = measure_source(
        &mut source(generate_sine(44_100, 1, 800.0, 0.5, 1.0), 44_100, 1),
        PeakAnalysis::Simple,
    )
    .unwrap();
    let b = measure_source(
        &mut source(generate_sine(96_000, 2, 800.0, 0.5, 1.0), 96_000, 2),
        PeakAnalysis::Simple,
    )
    .unwrap();

    let album = calc.album(&[&a, &b]).unwrap();
    assert!(album.gain_db.is_finite());
    assert_eq!(a.sample_rate, 44_100);
    assert_eq!(b.sample_rate, 96_000);
}

// ========== Provider ==========

#[test]
fn provider_album_gain_shared_and_peak_is_max() {
    let analyzer = ReplayGainAnalyzer::new();
    let settings = ValidatedSettings::empty();

    let members: Vec<_> = [0.2_f32, 0.5, 0.35]
        .iter()
        .map(|amplitude| {
            let samples = generate_sine(44_100, 1, 440.0, *amplitude, 2.0);
            analyzer.measure(&mut source(samples, 44_100, 1), &settings).unwrap()
        })
        .collect();

    let album = analyzer.aggregate(&members, &settings).unwrap();
    let max_peak = members.iter().map(|m| m.track.peak).fold(0.0, f64::max);
    assert_eq!(album.peak, max_peak);

    let gains: Vec<_> = members.iter().map(|m| m.track.gain_db).collect();
    assert!(gains[0] > gains[2] && gains[2] > gains[1]);
}
