//! EBU R128 loudness and peak measurement
//!
//! Wraps the ebur128 crate. One `LoudnessMeter` is fed the interleaved
//! frames of a single track and produces a `TrackLoudness`, which keeps the
//! meter state so several tracks can later be combined into album loudness.

use crate::error::{LoudnessError, Result};
use ebur128::{Channel, EbuR128, Mode};
use std::fmt;
use timbre_core::{AudioFormat, SampleSource};
use tracing::debug;

/// Frames pulled from a source per read
pub const CHUNK_FRAMES: usize = 4096;

/// Length of one BS.1770 gating block
const GATING_BLOCK_MS: u64 = 400;

/// Peak detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakAnalysis {
    /// Maximum absolute sample value
    #[default]
    Simple,
    /// Inter-sample peak estimate from 4x oversampling (may exceed 1.0)
    Interpolated,
}

impl PeakAnalysis {
    /// Setting values, in schema order
    pub const CHOICES: [&'static str; 2] = ["Simple", "Interpolated"];

    /// Setting value for this strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::Interpolated => "Interpolated",
        }
    }

    /// Parse a setting value (exact match)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Simple" => Some(Self::Simple),
            "Interpolated" => Some(Self::Interpolated),
            _ => None,
        }
    }

    fn mode(self) -> Mode {
        match self {
            Self::Simple => Mode::I | Mode::M | Mode::SAMPLE_PEAK,
            Self::Interpolated => Mode::I | Mode::M | Mode::SAMPLE_PEAK | Mode::TRUE_PEAK,
        }
    }
}

impl fmt::Display for PeakAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loudness measurement of one track
pub struct TrackLoudness {
    state: EbuR128,
    /// Integrated loudness in LUFS (`-inf` for silence or no frames)
    ///
    /// A track shorter than one gating block is measured over its whole
    /// duration instead.
    pub integrated_lufs: f64,
    /// Peak amplitude (linear) per the selected strategy
    pub peak: f64,
    /// Peak strategy used
    pub peak_analysis: PeakAnalysis,
    /// Frames measured
    pub frames: u64,
    /// Sample rate of the measured track
    pub sample_rate: u32,
    /// Channel count of the measured track
    pub channels: u16,
}

impl TrackLoudness {
    /// Meter state, used for album aggregation
    pub fn state(&self) -> &EbuR128 {
        &self.state
    }

    /// True if no frames were measured
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

impl fmt::Debug for TrackLoudness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackLoudness")
            .field("integrated_lufs", &self.integrated_lufs)
            .field("peak", &self.peak)
            .field("peak_analysis", &self.peak_analysis)
            .field("frames", &self.frames)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// EBU R128 meter for one track
///
/// # Example
///
/// ```ignore
/// use timbre_loudness::{LoudnessMeter, PeakAnalysis};
///
/// let mut meter = LoudnessMeter::new(format, PeakAnalysis::Interpolated)?;
/// meter.add_frames(&interleaved)?;
/// let loudness = meter.finish()?;
/// println!("{:.1} LUFS, peak {:.6}", loudness.integrated_lufs, loudness.peak);
/// ```
pub struct LoudnessMeter {
    ebur128: EbuR128,
    peak_analysis: PeakAnalysis,
    sample_rate: u32,
    channels: u16,
    frames: u64,
}

impl LoudnessMeter {
    /// Create a meter for audio in `format`
    ///
    /// Mono audio is measured as dual mono, as ReplayGain 2.0 prescribes.
    ///
    /// # Errors
    /// Returns error if sample rate or channel count is outside what the
    /// meter supports
    pub fn new(format: AudioFormat, peak_analysis: PeakAnalysis) -> Result<Self> {
        let sample_rate = format.sample_rate.as_hz();
        if !(8000..=384_000).contains(&sample_rate) {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if !(1..=8).contains(&format.channels) {
            return Err(LoudnessError::InvalidChannelCount(format.channels));
        }

        let mut ebur128 = EbuR128::new(u32::from(format.channels), sample_rate, peak_analysis.mode())?;
        if format.channels == 1 {
            ebur128.set_channel(0, Channel::DualMono)?;
        }

        Ok(Self {
            ebur128,
            peak_analysis,
            sample_rate,
            channels: format.channels,
            frames: 0,
        })
    }

    /// Add interleaved frames
    pub fn add_frames(&mut self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let channels = usize::from(self.channels);
        if samples.len() % channels != 0 {
            return Err(LoudnessError::AnalysisError(format!(
                "Sample count {} is not divisible by channel count {}",
                samples.len(),
                self.channels
            )));
        }

        self.ebur128.add_frames_f32(samples)?;
        self.frames += (samples.len() / channels) as u64;
        Ok(())
    }

    /// Measured duration in whole milliseconds
    fn duration_ms(&self) -> u64 {
        self.frames * 1000 / u64::from(self.sample_rate)
    }

    /// Loudness of everything added so far, ungated
    ///
    /// Only valid while the meter's 400 ms history still holds every frame.
    fn whole_track_loudness(&self) -> Result<f64> {
        let window = self.duration_ms().clamp(1, GATING_BLOCK_MS - 1);
        Ok(self.ebur128.loudness_window(window as u32)?)
    }

    /// Finish measuring and compute loudness and peak
    pub fn finish(self) -> Result<TrackLoudness> {
        let integrated_lufs = if self.frames == 0 {
            f64::NEG_INFINITY
        } else {
            let gated = self.ebur128.loudness_global()?;
            // No complete gating block: fall back to the whole (short) track
            if gated.is_finite() || self.duration_ms() >= GATING_BLOCK_MS {
                gated
            } else {
                let short = self.whole_track_loudness()?;
                debug!("Track shorter than one gating block, measured {:.2} LUFS ungated", short);
                short
            }
        };

        let mut sample_peak = 0.0_f64;
        let mut true_peak = 0.0_f64;
        for channel in 0..u32::from(self.channels) {
            sample_peak = sample_peak.max(self.ebur128.sample_peak(channel)?);
            if self.peak_analysis == PeakAnalysis::Interpolated {
                true_peak = true_peak.max(self.ebur128.true_peak(channel)?);
            }
        }

        // The oversampled estimate never reports less than an actual sample
        let peak = match self.peak_analysis {
            PeakAnalysis::Simple => sample_peak,
            PeakAnalysis::Interpolated => true_peak.max(sample_peak),
        };

        Ok(TrackLoudness {
            state: self.ebur128,
            integrated_lufs,
            peak,
            peak_analysis: self.peak_analysis,
            frames: self.frames,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}

/// Measure a whole source from its first frame
///
/// The source is rewound before reading, so it can be measured again later.
pub fn measure_source(source: &mut dyn SampleSource, peak_analysis: PeakAnalysis) -> Result<TrackLoudness> {
    let mut meter = LoudnessMeter::new(source.format(), peak_analysis)?;
    source.rewind()?;

    let mut buffer = Vec::with_capacity(CHUNK_FRAMES * usize::from(source.format().channels));
    loop {
        buffer.clear();
        let frames = source.read_frames(CHUNK_FRAMES, &mut buffer)?;
        if frames == 0 {
            break;
        }
        meter.add_frames(&buffer)?;
    }

    let loudness = meter.finish()?;
    debug!(
        "Measured {} frames: {:.2} LUFS, {} peak {:.6}",
        loudness.frames, loudness.integrated_lufs, loudness.peak_analysis, loudness.peak
    );
    Ok(loudness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_core::{MemorySampleSource, SampleRate};

    fn sine(frequency: f32, amplitude: f32, frames: usize, rate: u32) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * frequency * i as f32 / rate as f32).sin())
            .collect()
    }

    fn mono(samples: Vec<f32>) -> MemorySampleSource {
        MemorySampleSource::new(samples, AudioFormat::new(SampleRate::CD_QUALITY, 1, 16)).unwrap()
    }

    #[test]
    fn test_peak_analysis_names() {
        assert_eq!(PeakAnalysis::from_name("Simple"), Some(PeakAnalysis::Simple));
        assert_eq!(PeakAnalysis::from_name("Interpolated"), Some(PeakAnalysis::Interpolated));
        assert_eq!(PeakAnalysis::from_name("simple"), None);
        assert_eq!(PeakAnalysis::default(), PeakAnalysis::Simple);
    }

    #[test]
    fn test_invalid_format() {
        let format = AudioFormat::new(SampleRate::new(4000), 2, 16);
        assert!(matches!(
            LoudnessMeter::new(format, PeakAnalysis::Simple),
            Err(LoudnessError::InvalidSampleRate(4000))
        ));

        let format = AudioFormat::new(SampleRate::CD_QUALITY, 9, 16);
        assert!(matches!(
            LoudnessMeter::new(format, PeakAnalysis::Simple),
            Err(LoudnessError::InvalidChannelCount(9))
        ));
    }

    #[test]
    fn test_simple_peak_is_max_abs_sample() {
        let mut samples = vec![0.1_f32; 44_100];
        samples[100] = -0.75;
        samples[200] = 0.5;
        let loudness = measure_source(&mut mono(samples), PeakAnalysis::Simple).unwrap();
        assert!((loudness.peak - 0.75).abs() < 1e-6);
        assert_eq!(loudness.frames, 44_100);
    }

    #[test]
    fn test_empty_source() {
        let loudness = measure_source(&mut mono(Vec::new()), PeakAnalysis::Interpolated).unwrap();
        assert!(loudness.is_empty());
        assert_eq!(loudness.peak, 0.0);
        assert_eq!(loudness.integrated_lufs, f64::NEG_INFINITY);
    }

    #[test]
    fn test_source_is_rewound() {
        let mut source = mono(sine(1000.0, 0.5, 44_100, 44_100));
        let first = measure_source(&mut source, PeakAnalysis::Simple).unwrap();
        let second = measure_source(&mut source, PeakAnalysis::Simple).unwrap();
        assert_eq!(first.frames, second.frames);
        assert!((first.integrated_lufs - second.integrated_lufs).abs() < 1e-9);
    }

    #[test]
    fn test_louder_sine_measures_louder() {
        let quiet = measure_source(&mut mono(sine(1000.0, 0.1, 88_200, 44_100)), PeakAnalysis::Simple).unwrap();
        let loud = measure_source(&mut mono(sine(1000.0, 0.8, 88_200, 44_100)), PeakAnalysis::Simple).unwrap();
        assert!(loud.integrated_lufs > quiet.integrated_lufs);
        // 8x amplitude is about 18 dB
        assert!((loud.integrated_lufs - quiet.integrated_lufs - 18.06).abs() < 0.5);
    }

    #[test]
    fn test_sub_block_tone_is_measured() {
        let short = measure_source(&mut mono(sine(1000.0, 0.9, 13_230, 44_100)), PeakAnalysis::Simple).unwrap();
        let long = measure_source(&mut mono(sine(1000.0, 0.9, 88_200, 44_100)), PeakAnalysis::Simple).unwrap();

        assert!(short.integrated_lufs.is_finite());
        assert!((short.integrated_lufs - long.integrated_lufs).abs() < 1.0);
    }

    #[test]
    fn test_sub_block_silence_stays_silent() {
        let loudness = measure_source(&mut mono(vec![0.0; 4410]), PeakAnalysis::Simple).unwrap();
        assert_eq!(loudness.frames, 4410);
        assert_eq!(loudness.integrated_lufs, f64::NEG_INFINITY);
    }

    #[test]
    fn test_misaligned_frames_rejected() {
        let format = AudioFormat::new(SampleRate::CD_QUALITY, 2, 16);
        let mut meter = LoudnessMeter::new(format, PeakAnalysis::Simple).unwrap();
        assert!(meter.add_frames(&[0.1, 0.2, 0.3]).is_err());
    }
}
