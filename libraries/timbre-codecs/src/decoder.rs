/// Audio decoder implementation using Symphonia
use crate::error::{CodecError, Result};
use crate::tags::read_metadata;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use timbre_core::{
    AudioDecoder, AudioFormat, AudioItem, CapabilityDescriptor, MemorySampleSource, MetadataRecord,
    SampleRate,
};
use tracing::{debug, warn};

/// Extensions the decoder registers for
pub const DECODER_EXTENSIONS: [&str; 7] = ["wav", "flac", "mp3", "m4a", "ogg", "oga", "opus"];

/// Audio decoder using Symphonia
///
/// Decodes the whole file into memory, keeping the source channel layout,
/// and reads its tags with lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    /// Registered provider name
    pub const NAME: &'static str = "Symphonia";

    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Registry descriptor
    pub fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(Self::NAME, "Decodes WAV, FLAC, MP3, AAC, Vorbis and Opus")
            .with_extensions(DECODER_EXTENSIONS)
    }

    /// Decode every sample of a file
    pub fn decode_samples(path: &Path) -> Result<MemorySampleSource> {
        if !path.exists() {
            return Err(CodecError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| CodecError::DecodeError("No audio tracks found".to_string()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());
        // Unknown for lossy codecs
        let bits_per_sample = track.codec_params.bits_per_sample.unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Skip packets that are not for the default track
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());

                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                // A corrupt packet is skipped, the rest of the stream stays usable
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet in {:?}: {}", path, e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let sample_rate = sample_rate
            .ok_or_else(|| CodecError::DecodeError("Unknown sample rate".to_string()))?;
        let channels = channels
            .and_then(|c| u16::try_from(c).ok())
            .ok_or_else(|| CodecError::DecodeError("Unknown channel layout".to_string()))?;
        let bits_per_sample = u16::try_from(bits_per_sample).unwrap_or(0);

        let format = AudioFormat::new(SampleRate::new(sample_rate), channels, bits_per_sample);
        let source = MemorySampleSource::new(samples, format)?;

        debug!(
            "Decoded {:?}: {} frames, {} Hz, {} channels",
            path,
            timbre_core::SampleSource::frame_count(&source),
            sample_rate,
            channels
        );
        Ok(source)
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> timbre_core::Result<AudioItem> {
        let source = Self::decode_samples(path)?;

        let metadata = match read_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Could not read tags from {:?}: {}", path, e);
                MetadataRecord::new()
            }
        };

        Ok(AudioItem::new(Box::new(source), metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_core::TimbreError;

    #[test]
    fn test_descriptor_extensions() {
        let descriptor = SymphoniaDecoder::descriptor();
        assert!(descriptor.handles_extension("flac"));
        assert!(descriptor.handles_extension(".MP3"));
        assert!(!descriptor.handles_extension("txt"));
    }

    #[test]
    fn test_nonexistent_file() {
        let err = SymphoniaDecoder::new()
            .decode(Path::new("/nonexistent/file.wav"))
            .unwrap_err();
        assert!(matches!(err, TimbreError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
