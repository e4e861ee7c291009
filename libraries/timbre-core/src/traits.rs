/// Provider contracts for decoders, encoders, analyzers and tag writers
use crate::error::Result;
use crate::settings::ValidatedSettings;
use crate::types::{MetadataRecord, SampleSource};
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

/// An opened audio item: its samples and the metadata read alongside them
pub struct AudioItem {
    /// Decoded samples
    pub source: Box<dyn SampleSource>,
    /// Metadata, mutated in place by analysis
    pub metadata: MetadataRecord,
}

impl AudioItem {
    /// Pair a source with its metadata
    pub fn new(source: Box<dyn SampleSource>, metadata: MetadataRecord) -> Self {
        Self { source, metadata }
    }
}

impl fmt::Debug for AudioItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioItem")
            .field("format", &self.source.format())
            .field("frames", &self.source.frame_count())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Audio decoder provider
///
/// Implementers open a file and return its samples and metadata. Container
/// and codec problems surface as `UnsupportedFormat` or `InvalidFormat`.
pub trait AudioDecoder: Send + Sync {
    /// Decode the file at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded
    fn decode(&self, path: &Path) -> Result<AudioItem>;
}

/// Output of an encoder run
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArtifact {
    /// Where the encoded file was written
    pub path: PathBuf,
    /// Container format, as a file extension ("wav", "flac", ...)
    pub format: String,
    /// Frames written
    pub frames: u64,
    /// Metadata that should be attached to the file
    pub metadata: MetadataRecord,
}

/// Audio encoder provider
pub trait AudioEncoder: Send + Sync {
    /// Encode `source` to `destination`
    ///
    /// `settings` have already been validated against this encoder's schema.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written
    fn encode(
        &self,
        source: &mut dyn SampleSource,
        metadata: &MetadataRecord,
        settings: &ValidatedSettings,
        destination: &Path,
    ) -> Result<EncodedArtifact>;
}

/// Peak and gain of one analyzed item
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackAnalysis {
    /// Peak amplitude, linear (can exceed 1.0 with interpolated peaks)
    pub peak: f64,
    /// Gain adjustment in dB
    pub gain_db: f64,
}

/// Per-item measurement kept until a group is aggregated
///
/// `detail` carries the provider's own state (for example a loudness
/// histogram) and is only ever read back by the provider that produced it.
pub struct TrackMeasurement {
    /// Track-level result
    pub track: TrackAnalysis,
    /// Provider-private measurement state
    pub detail: Box<dyn Any + Send>,
}

impl fmt::Debug for TrackMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackMeasurement")
            .field("track", &self.track)
            .finish_non_exhaustive()
    }
}

/// Album-level result aggregated over every member of a group
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlbumAnalysis {
    /// Maximum of the members' peaks
    pub peak: f64,
    /// Gain from the combined loudness of all members, in dB
    pub gain_db: f64,
}

/// Analyzer provider
///
/// Measurement and aggregation are separate so that the caller can measure
/// members independently and aggregate once every measurement is in.
pub trait AudioAnalyzer: Send + Sync {
    /// Measure one item
    fn measure(
        &self,
        source: &mut dyn SampleSource,
        settings: &ValidatedSettings,
    ) -> Result<TrackMeasurement>;

    /// Combine the measurements of every group member
    ///
    /// # Errors
    /// `ProviderContract` if a measurement came from a different provider
    fn aggregate(
        &self,
        members: &[TrackMeasurement],
        settings: &ValidatedSettings,
    ) -> Result<AlbumAnalysis>;
}

/// Writes a `MetadataRecord` into a file's native tag format
pub trait TagWriter: Send + Sync {
    /// Replace the tags of the file at `path` with `metadata`
    fn write(&self, path: &Path, metadata: &MetadataRecord) -> Result<()>;
}
