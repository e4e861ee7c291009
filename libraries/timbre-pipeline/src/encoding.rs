//! Encoding orchestration
//!
//! Settings are validated against the chosen encoder's own schema, so a key
//! only some other encoder understands is rejected rather than ignored.
//! After encoding, the tag writer registered for the artifact's container
//! attaches its metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use timbre_core::{
    CapabilityRegistry, EncodedArtifact, MetadataRecord, ProviderKind, Result, SampleSource,
    SettingsMap, TimbreError,
};
use tracing::{debug, info, warn};

/// Runs encoders from a registry
#[derive(Debug, Clone)]
pub struct EncodingOrchestrator {
    registry: Arc<CapabilityRegistry>,
}

impl EncodingOrchestrator {
    /// Create an orchestrator over a populated registry
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Encode `source` to `destination` with the named encoder and tag the result
    ///
    /// # Errors
    /// `UnsupportedProvider` or a settings error before anything is written;
    /// encoder and tag writer errors propagate unchanged
    pub fn encode(
        &self,
        provider: &str,
        settings: &SettingsMap,
        source: &mut dyn SampleSource,
        metadata: &MetadataRecord,
        destination: &Path,
    ) -> Result<EncodedArtifact> {
        let registered = self.registry.resolve(ProviderKind::Encoder, provider)?;
        let encoder = registered.encoder().ok_or_else(|| {
            TimbreError::ProviderContract(format!("{} is not an encoder", provider))
        })?;
        let settings = registered.descriptor.schema.validate(settings)?;

        info!("Encoding {:?} with {}", destination, provider);
        let artifact = encoder.encode(source, metadata, &settings, destination)?;

        if artifact.metadata.is_empty() {
            debug!("No metadata to attach to {:?}", artifact.path);
            return Ok(artifact);
        }
        match self.registry.tag_writer(&artifact.format) {
            Some(writer) => writer.write(&artifact.path, &artifact.metadata)?,
            None => warn!(
                "No tag writer for {} output, {:?} left untagged",
                artifact.format, artifact.path
            ),
        }
        Ok(artifact)
    }
}

/// Output path for `input` inside `directory`, with the extension of `format`
pub fn destination_for(directory: &Path, input: &Path, format: &str) -> PathBuf {
    let stem = input.file_stem().map_or_else(|| "output".into(), |s| s.to_os_string());
    let mut path = directory.join(stem);
    path.set_extension(format);
    path
}
