/// Opening and saving files through registered providers
use std::path::Path;
use timbre_core::{AudioItem, CapabilityRegistry, MetadataRecord, ProviderKind, Result, TimbreError};
use tracing::debug;

fn extension(path: &Path) -> Result<&str> {
    path.extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| TimbreError::unsupported_format(format!("{:?} has no file extension", path)))
}

/// Decode a file with the decoder registered for its extension
///
/// # Errors
/// `UnsupportedFormat` when no decoder handles the extension, otherwise
/// whatever the decoder reports
pub fn open_item(registry: &CapabilityRegistry, path: &Path) -> Result<AudioItem> {
    let ext = extension(path)?;
    let registered = registry
        .find_by_extension(ProviderKind::Decoder, ext)
        .ok_or_else(|| TimbreError::unsupported_format(format!("no decoder for .{}", ext)))?;
    let decoder = registered.decoder().ok_or_else(|| {
        TimbreError::ProviderContract(format!("{} is not a decoder", registered.descriptor.name))
    })?;

    debug!("Opening {:?} with {}", path, registered.descriptor.name);
    decoder.decode(path)
}

/// Write `metadata` into the tags of an existing file
///
/// # Errors
/// `UnsupportedFormat` when no tag writer is registered for the extension
pub fn save_metadata(registry: &CapabilityRegistry, path: &Path, metadata: &MetadataRecord) -> Result<()> {
    let ext = extension(path)?;
    let writer = registry
        .tag_writer(ext)
        .ok_or_else(|| TimbreError::unsupported_format(format!("no tag writer for .{}", ext)))?;
    writer.write(path, metadata)?;
    debug!("Saved tags to {:?}", path);
    Ok(())
}
