/// Audio format and sample source types
use crate::error::{Result, TimbreError};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }
}

/// Audio format information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate
    pub sample_rate: SampleRate,

    /// Number of channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,

    /// Bits per sample of the original encoding (informational)
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// Create a new audio format
    pub fn new(sample_rate: SampleRate, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Create CD quality stereo format (44.1kHz, 16-bit, stereo)
    pub fn cd_quality() -> Self {
        Self {
            sample_rate: SampleRate::CD_QUALITY,
            channels: 2,
            bits_per_sample: 16,
        }
    }

    /// Reject formats no sample source can carry
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(TimbreError::invalid_argument("channel count must be at least 1"));
        }
        if self.sample_rate.as_hz() == 0 {
            return Err(TimbreError::invalid_argument("sample rate must be non-zero"));
        }
        Ok(())
    }
}

/// A finite, restartable, seekable source of decoded samples
///
/// Samples are f32, nominally in [-1.0, 1.0], interleaved by channel.
/// Positions and counts are in frames (one sample per channel).
pub trait SampleSource: Send {
    /// Format of the samples this source produces
    fn format(&self) -> AudioFormat;

    /// Total number of frames
    fn frame_count(&self) -> u64;

    /// Current read position in frames
    fn position(&self) -> u64;

    /// Move the read position
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `frame` is past the end
    fn seek(&mut self, frame: u64) -> Result<()>;

    /// Append up to `max_frames` interleaved frames to `out`
    ///
    /// Returns the number of frames appended; 0 means end of stream.
    fn read_frames(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<usize>;

    /// Restart reading from the first frame
    fn rewind(&mut self) -> Result<()> {
        self.seek(0)
    }

    /// Duration in seconds
    fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.format().sample_rate.as_hz())
    }
}

/// In-memory sample source over a fully decoded track
#[derive(Debug, Clone)]
pub struct MemorySampleSource {
    samples: Vec<f32>,
    format: AudioFormat,
    position: u64,
}

impl MemorySampleSource {
    /// Wrap interleaved samples
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the format is unusable or the sample count
    /// is not a whole number of frames
    pub fn new(samples: Vec<f32>, format: AudioFormat) -> Result<Self> {
        format.validate()?;
        if samples.len() % usize::from(format.channels) != 0 {
            return Err(TimbreError::invalid_argument(format!(
                "sample count {} is not divisible by channel count {}",
                samples.len(),
                format.channels
            )));
        }

        Ok(Self {
            samples,
            format,
            position: 0,
        })
    }

    /// Build a source from one buffer per channel
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: SampleRate, bits_per_sample: u16) -> Result<Self> {
        let count = channels.len();
        let frames = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|c| c.len() != frames) {
            return Err(TimbreError::invalid_argument("channel buffers differ in length"));
        }

        let mut samples = Vec::with_capacity(frames * count);
        for frame in 0..frames {
            for channel in channels {
                samples.push(channel[frame]);
            }
        }

        let channels = u16::try_from(count)
            .map_err(|_| TimbreError::invalid_argument("too many channels"))?;
        Self::new(samples, AudioFormat::new(sample_rate, channels, bits_per_sample))
    }

    /// All samples, interleaved
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl SampleSource for MemorySampleSource {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn frame_count(&self) -> u64 {
        (self.samples.len() / usize::from(self.format.channels)) as u64
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        if frame > self.frame_count() {
            return Err(TimbreError::invalid_argument(format!(
                "seek to frame {} past end ({} frames)",
                frame,
                self.frame_count()
            )));
        }
        self.position = frame;
        Ok(())
    }

    fn read_frames(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<usize> {
        let channels = usize::from(self.format.channels);
        let remaining = (self.frame_count() - self.position) as usize;
        let frames = remaining.min(max_frames);
        let start = self.position as usize * channels;

        out.extend_from_slice(&self.samples[start..start + frames * channels]);
        self.position += frames as u64;

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(frames: usize) -> MemorySampleSource {
        let samples = (0..frames * 2).map(|i| i as f32 / 100.0).collect();
        MemorySampleSource::new(samples, AudioFormat::cd_quality()).unwrap()
    }

    #[test]
    fn sample_rate_common_values() {
        assert_eq!(SampleRate::CD_QUALITY.as_hz(), 44_100);
        assert_eq!(SampleRate::DVD_QUALITY.as_hz(), 48_000);
    }

    #[test]
    fn rejects_partial_frames() {
        let result = MemorySampleSource::new(vec![0.0; 5], AudioFormat::cd_quality());
        assert!(matches!(result, Err(TimbreError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_zero_channels() {
        let format = AudioFormat::new(SampleRate::CD_QUALITY, 0, 16);
        assert!(MemorySampleSource::new(Vec::new(), format).is_err());
    }

    #[test]
    fn reads_in_chunks_until_exhausted() {
        let mut source = stereo(10);
        let mut out = Vec::new();

        assert_eq!(source.read_frames(4, &mut out).unwrap(), 4);
        assert_eq!(source.read_frames(4, &mut out).unwrap(), 4);
        assert_eq!(source.read_frames(4, &mut out).unwrap(), 2);
        assert_eq!(source.read_frames(4, &mut out).unwrap(), 0);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn rewind_restarts_stream() {
        let mut source = stereo(3);
        let mut first = Vec::new();
        source.read_frames(usize::MAX, &mut first).unwrap();

        source.rewind().unwrap();
        let mut second = Vec::new();
        source.read_frames(usize::MAX, &mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn seek_past_end_fails() {
        let mut source = stereo(3);
        assert!(source.seek(3).is_ok());
        assert!(source.seek(4).is_err());
    }

    #[test]
    fn from_channels_interleaves() {
        let source = MemorySampleSource::from_channels(
            &[vec![1.0, 2.0], vec![-1.0, -2.0]],
            SampleRate::CD_QUALITY,
            16,
        )
        .unwrap();
        assert_eq!(source.samples(), &[1.0, -1.0, 2.0, -2.0]);
        assert_eq!(source.frame_count(), 2);
    }

    #[test]
    fn duration_in_seconds() {
        let source = stereo(44_100);
        assert!((source.duration_secs() - 1.0).abs() < 1e-9);
    }
}
