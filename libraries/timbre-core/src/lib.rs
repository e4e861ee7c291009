//! Timbre Core
//!
//! Provider-agnostic types, contracts and the capability registry for Timbre.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `MetadataRecord`, `CoverArt`, `AudioFormat`, `SampleSource`
//! - **Settings**: `SettingsSchema` declarations and `ValidatedSettings`
//! - **Provider Traits**: `AudioDecoder`, `AudioEncoder`, `AudioAnalyzer`, `TagWriter`
//! - **Registry**: `CapabilityRegistry` for lookup by name or extension
//! - **Error Handling**: Unified `TimbreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use timbre_core::MetadataRecord;
//!
//! let mut metadata = MetadataRecord::new();
//! metadata.set_title("Test Title");
//! metadata.set_track_number("3").unwrap();
//!
//! assert_eq!(metadata.track_number(), "03");
//! assert!(metadata.set_day("32").is_err());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod registry;
pub mod settings;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TimbreError};
pub use registry::{CapabilityDescriptor, CapabilityRegistry, Provider, ProviderKind, RegisteredProvider};
pub use settings::{SettingInfo, SettingValue, SettingsMap, SettingsSchema, ValidatedSettings};
pub use traits::{
    AlbumAnalysis, AudioAnalyzer, AudioDecoder, AudioEncoder, AudioItem, EncodedArtifact, TagWriter,
    TrackAnalysis, TrackMeasurement,
};
pub use types::{
    AudioFormat, CoverArt, MemorySampleSource, MetadataField, MetadataRecord, MetadataSnapshot,
    SampleRate, SampleSource,
};
