//! Domain types: audio formats, sample sources and metadata

mod audio;
mod cover_art;
mod fields;
mod metadata;
mod snapshot;

pub use audio::{AudioFormat, MemorySampleSource, SampleRate, SampleSource};
pub use cover_art::CoverArt;
pub use fields::{
    format_gain, format_peak, normalize_counter, normalize_gain, normalize_peak, normalize_year,
    MetadataField,
};
pub use metadata::MetadataRecord;
pub use snapshot::{CoverArtSnapshot, MetadataSnapshot};
