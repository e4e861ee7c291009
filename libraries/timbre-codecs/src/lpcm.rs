//! Linear PCM (WAV) encoder
//!
//! Writes integer PCM through hound. Optional ReplayGain application scales
//! the samples by the stored track or album gain, limited so the stored peak
//! does not clip; the emitted metadata then drops its ReplayGain fields,
//! since they no longer describe the output.

use crate::error::{CodecError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use timbre_core::{
    AudioEncoder, CapabilityDescriptor, EncodedArtifact, MetadataRecord, SampleSource, SettingsSchema,
    ValidatedSettings,
};
use timbre_loudness::{apply_gain, CHUNK_FRAMES};
use tracing::{debug, info, warn};

/// Which stored gain to apply while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyGain {
    Track,
    Album,
}

impl ApplyGain {
    /// Setting values, in schema order
    pub const CHOICES: [&'static str; 2] = ["Track", "Album"];

    /// Parse a setting value (exact match)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Track" => Some(Self::Track),
            "Album" => Some(Self::Album),
            _ => None,
        }
    }

    /// Stored (gain, peak) strings for this mode
    fn stored<'a>(&self, metadata: &'a MetadataRecord) -> (&'a str, &'a str) {
        match self {
            Self::Track => (metadata.track_gain(), metadata.track_peak()),
            Self::Album => (metadata.album_gain(), metadata.album_peak()),
        }
    }
}

/// WAV encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct LpcmEncoder;

impl LpcmEncoder {
    /// Registered provider name
    pub const NAME: &'static str = "LPCM";

    /// Output container
    pub const FORMAT: &'static str = "wav";

    /// Settings key for the output bit depth
    pub const BITS_PER_SAMPLE: &'static str = "BitsPerSample";

    /// Settings key selecting a stored gain to apply
    pub const APPLY_GAIN: &'static str = "ApplyGain";

    /// Supported bit depths
    pub const BIT_DEPTHS: [i64; 3] = [8, 16, 24];

    /// Create a new encoder
    pub fn new() -> Self {
        Self
    }

    /// Settings this encoder accepts
    pub fn schema() -> SettingsSchema {
        SettingsSchema::new()
            .with_int_set(Self::BITS_PER_SAMPLE, Self::BIT_DEPTHS)
            .with_text_choices(Self::APPLY_GAIN, ApplyGain::CHOICES)
    }

    /// Registry descriptor
    pub fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(Self::NAME, "Uncompressed integer PCM in a WAV container")
            .with_extensions([Self::FORMAT])
            .with_schema(Self::schema())
    }

    /// Output bit depth: the setting, else the source depth if supported, else 16
    fn bits_per_sample(settings: &ValidatedSettings, source_bits: u16) -> u16 {
        settings
            .int(Self::BITS_PER_SAMPLE)
            .and_then(|bits| u16::try_from(bits).ok())
            .unwrap_or_else(|| {
                if Self::BIT_DEPTHS.contains(&i64::from(source_bits)) {
                    source_bits
                } else {
                    16
                }
            })
    }

    /// Gain to apply and the peak to limit it against
    ///
    /// Returns `None` when no gain was requested or the stored gain is absent.
    fn requested_gain(
        source: &mut dyn SampleSource,
        metadata: &MetadataRecord,
        settings: &ValidatedSettings,
    ) -> Result<Option<(f64, f64)>> {
        let Some(mode) = settings.text(Self::APPLY_GAIN).and_then(ApplyGain::from_name) else {
            return Ok(None);
        };

        let (gain, peak) = mode.stored(metadata);
        let Ok(gain_db) = gain.parse::<f64>() else {
            warn!("{:?} gain requested but not present in metadata, encoding without gain", mode);
            return Ok(None);
        };

        let peak = match peak.parse::<f64>() {
            Ok(peak) => peak,
            Err(_) => scan_peak(source)?,
        };
        Ok(Some((gain_db, peak)))
    }
}

/// Largest absolute sample in a source
fn scan_peak(source: &mut dyn SampleSource) -> Result<f64> {
    source.rewind()?;
    let mut buffer = Vec::new();
    let mut peak = 0.0_f64;
    loop {
        buffer.clear();
        if source.read_frames(CHUNK_FRAMES, &mut buffer)? == 0 {
            break;
        }
        peak = buffer.iter().map(|s| f64::from(s.abs())).fold(peak, f64::max);
    }
    Ok(peak)
}

/// Convert a float sample to a signed integer of `bits` width
fn quantize(sample: f32, bits: u16) -> i32 {
    let scale = f64::from(1_u32 << (bits - 1));
    let max = scale - 1.0;
    (f64::from(sample) * scale).round().clamp(-scale, max) as i32
}

impl AudioEncoder for LpcmEncoder {
    fn encode(
        &self,
        source: &mut dyn SampleSource,
        metadata: &MetadataRecord,
        settings: &ValidatedSettings,
        destination: &Path,
    ) -> timbre_core::Result<EncodedArtifact> {
        let format = source.format();
        let bits = Self::bits_per_sample(settings, format.bits_per_sample);
        let gain = Self::requested_gain(source, metadata, settings)?;

        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate.as_hz(),
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(destination, spec).map_err(CodecError::from)?;
        source.rewind()?;

        let mut buffer = Vec::with_capacity(CHUNK_FRAMES * usize::from(format.channels));
        let mut frames = 0_u64;
        loop {
            buffer.clear();
            let read = source.read_frames(CHUNK_FRAMES, &mut buffer)?;
            if read == 0 {
                break;
            }
            if let Some((gain_db, peak)) = gain {
                apply_gain(&mut buffer, gain_db, Some(peak));
            }
            for sample in &buffer {
                writer
                    .write_sample(quantize(*sample, bits))
                    .map_err(CodecError::from)?;
            }
            frames += read as u64;
        }
        writer.finalize().map_err(CodecError::from)?;

        let mut output_metadata = metadata.clone();
        if let Some((gain_db, _)) = gain {
            debug!("Applied {:.2} dB gain", gain_db);
            output_metadata.clear_replaygain();
        }

        info!("Encoded {} frames to {:?} ({}-bit)", frames, destination, bits);
        Ok(EncodedArtifact {
            path: destination.to_path_buf(),
            format: Self::FORMAT.to_string(),
            frames,
            metadata: output_metadata,
        })
    }
}
