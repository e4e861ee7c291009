//! Built-in providers for Timbre
//!
//! - `SymphoniaDecoder`: WAV, FLAC, MP3, AAC/ALAC (MP4), Vorbis and Opus decoding
//! - `LpcmEncoder`: integer PCM WAV output through hound
//! - `LoftyTagWriter`: native tag writing for every container lofty supports
//!
//! `register_builtin_providers` adds these, plus the `ReplayGain` analyzer,
//! to a `CapabilityRegistry`.

#![deny(unsafe_code)]

mod decoder;
mod error;
mod lpcm;
mod tags;

pub use decoder::{SymphoniaDecoder, DECODER_EXTENSIONS};
pub use error::{CodecError, Result};
pub use lpcm::{ApplyGain, LpcmEncoder};
pub use tags::{
    metadata_from_tag, read_metadata, tag_from_metadata, write_metadata, LoftyTagWriter,
    TAGGABLE_EXTENSIONS,
};

use std::sync::Arc;
use timbre_core::{CapabilityRegistry, Provider};
use timbre_loudness::ReplayGainAnalyzer;
use tracing::debug;

/// Register every built-in provider and tag writer
///
/// # Errors
/// `DuplicateProvider` if a built-in name is already taken
pub fn register_builtin_providers(registry: &mut CapabilityRegistry) -> timbre_core::Result<()> {
    registry.register(
        SymphoniaDecoder::descriptor(),
        Provider::Decoder(Arc::new(SymphoniaDecoder::new())),
    )?;
    registry.register(
        LpcmEncoder::descriptor(),
        Provider::Encoder(Arc::new(LpcmEncoder::new())),
    )?;
    registry.register(
        ReplayGainAnalyzer::descriptor(),
        Provider::Analyzer(Arc::new(ReplayGainAnalyzer::new())),
    )?;

    let writer = Arc::new(LoftyTagWriter::new());
    for extension in TAGGABLE_EXTENSIONS {
        registry.register_tag_writer(extension, writer.clone());
    }

    debug!("Registered built-in providers");
    Ok(())
}

/// A registry holding only the built-in providers
pub fn builtin_registry() -> timbre_core::Result<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    register_builtin_providers(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_core::{ProviderKind, TimbreError};

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_registry().unwrap();

        assert!(registry.is_registered(ProviderKind::Decoder, "Symphonia"));
        assert!(registry.is_registered(ProviderKind::Encoder, "LPCM"));
        assert!(registry.is_registered(ProviderKind::Analyzer, "ReplayGain"));

        let decoder = registry
            .find_by_extension(ProviderKind::Decoder, ".FLAC")
            .unwrap();
        assert_eq!(decoder.descriptor.name, "Symphonia");
        assert!(registry.tag_writer("m4a").is_some());
        assert!(registry.tag_writer("aiff").is_none());
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut registry = builtin_registry().unwrap();
        assert!(matches!(
            register_builtin_providers(&mut registry),
            Err(TimbreError::DuplicateProvider(_))
        ));
    }
}
