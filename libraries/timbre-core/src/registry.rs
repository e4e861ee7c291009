//! Capability Registry
//!
//! Providers register once at startup with a `CapabilityDescriptor`; the
//! orchestrators then look them up by name (or, for decoders, by file
//! extension) without knowing concrete types. How implementations are found
//! is up to the host: anything that calls `register` during bootstrap works.
//!
//! The registry is populated before any work starts and only read afterwards,
//! so it can be shared behind an `Arc` without locking.

use crate::error::{Result, TimbreError};
use crate::settings::SettingsSchema;
use crate::traits::{AudioAnalyzer, AudioDecoder, AudioEncoder, TagWriter};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::debug;

/// The role a provider plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Decoder,
    Encoder,
    Analyzer,
}

impl ProviderKind {
    /// Every kind, in listing order
    pub const ALL: [Self; 3] = [Self::Decoder, Self::Encoder, Self::Analyzer];
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Decoder => "decoder",
            Self::Encoder => "encoder",
            Self::Analyzer => "analyzer",
        })
    }
}

/// Identity and settings declaration of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDescriptor {
    /// Unique name within its kind (case-sensitive)
    pub name: String,
    /// One-line description
    pub description: String,
    /// File extensions handled, lowercase and without the leading dot
    pub extensions: Vec<String>,
    /// Options the provider accepts
    pub schema: SettingsSchema,
}

impl CapabilityDescriptor {
    /// Create a descriptor with no extensions and an empty schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            extensions: Vec::new(),
            schema: SettingsSchema::new(),
        }
    }

    /// Declare handled extensions
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Declare the settings schema
    #[must_use]
    pub fn with_schema(mut self, schema: SettingsSchema) -> Self {
        self.schema = schema;
        self
    }

    /// True if this provider handles `extension`
    pub fn handles_extension(&self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        self.extensions.iter().any(|e| *e == extension)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// A provider implementation, tagged by kind
#[derive(Clone)]
pub enum Provider {
    Decoder(Arc<dyn AudioDecoder>),
    Encoder(Arc<dyn AudioEncoder>),
    Analyzer(Arc<dyn AudioAnalyzer>),
}

impl Provider {
    /// The kind of this provider
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Decoder(_) => ProviderKind::Decoder,
            Self::Encoder(_) => ProviderKind::Encoder,
            Self::Analyzer(_) => ProviderKind::Analyzer,
        }
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider::{:?}", self.kind())
    }
}

/// A descriptor together with its implementation
#[derive(Debug, Clone)]
pub struct RegisteredProvider {
    pub descriptor: CapabilityDescriptor,
    pub provider: Provider,
}

impl RegisteredProvider {
    /// The decoder, if this is one
    pub fn decoder(&self) -> Option<&Arc<dyn AudioDecoder>> {
        match &self.provider {
            Provider::Decoder(d) => Some(d),
            _ => None,
        }
    }

    /// The encoder, if this is one
    pub fn encoder(&self) -> Option<&Arc<dyn AudioEncoder>> {
        match &self.provider {
            Provider::Encoder(e) => Some(e),
            _ => None,
        }
    }

    /// The analyzer, if this is one
    pub fn analyzer(&self) -> Option<&Arc<dyn AudioAnalyzer>> {
        match &self.provider {
            Provider::Analyzer(a) => Some(a),
            _ => None,
        }
    }
}

/// Registry of available providers and tag writers
///
/// # Example
///
/// ```ignore
/// let mut registry = CapabilityRegistry::new();
/// registry.register(
///     CapabilityDescriptor::new("ReplayGain", "ReplayGain 2.0 analysis"),
///     Provider::Analyzer(Arc::new(ReplayGainAnalyzer::new())),
/// )?;
///
/// let analyzer = registry.find_by_name(ProviderKind::Analyzer, "ReplayGain");
/// ```
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    providers: HashMap<ProviderKind, Vec<RegisteredProvider>>,
    tag_writers: HashMap<String, Arc<dyn TagWriter>>,
}

impl CapabilityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    ///
    /// # Errors
    /// `InvalidArgument` for an empty name; `DuplicateProvider` if a provider
    /// of the same kind is already registered under this name
    pub fn register(&mut self, descriptor: CapabilityDescriptor, provider: Provider) -> Result<()> {
        if descriptor.name.is_empty() {
            return Err(TimbreError::invalid_argument("provider name is empty"));
        }

        let kind = provider.kind();
        let entries = self.providers.entry(kind).or_default();
        if entries.iter().any(|e| e.descriptor.name == descriptor.name) {
            return Err(TimbreError::DuplicateProvider(descriptor.name));
        }

        debug!("Registered {} {:?}", kind, descriptor.name);
        entries.push(RegisteredProvider {
            descriptor,
            provider,
        });
        Ok(())
    }

    /// Register the tag writer for a container format
    ///
    /// A later registration for the same extension replaces the earlier one.
    pub fn register_tag_writer(&mut self, extension: &str, writer: Arc<dyn TagWriter>) {
        self.tag_writers.insert(normalize_extension(extension), writer);
    }

    /// Find a provider by exact name
    pub fn find_by_name(&self, kind: ProviderKind, name: &str) -> Option<&RegisteredProvider> {
        self.providers
            .get(&kind)?
            .iter()
            .find(|e| e.descriptor.name == name)
    }

    /// Find the first provider registered for a file extension
    pub fn find_by_extension(&self, kind: ProviderKind, extension: &str) -> Option<&RegisteredProvider> {
        self.providers
            .get(&kind)?
            .iter()
            .find(|e| e.descriptor.handles_extension(extension))
    }

    /// Find a provider by name, as orchestrators do
    ///
    /// # Errors
    /// `UnsupportedProvider` if nothing of this kind has that name
    pub fn resolve(&self, kind: ProviderKind, name: &str) -> Result<&RegisteredProvider> {
        self.find_by_name(kind, name)
            .ok_or_else(|| TimbreError::UnsupportedProvider(name.to_string()))
    }

    /// Tag writer for a container format
    pub fn tag_writer(&self, extension: &str) -> Option<&Arc<dyn TagWriter>> {
        self.tag_writers.get(&normalize_extension(extension))
    }

    /// Descriptors of one kind, sorted by name
    pub fn descriptors(&self, kind: ProviderKind) -> Vec<&CapabilityDescriptor> {
        let mut descriptors: Vec<_> = self
            .providers
            .get(&kind)
            .map(|entries| entries.iter().map(|e| &e.descriptor).collect())
            .unwrap_or_default();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Check if a name is registered for a kind
    pub fn is_registered(&self, kind: ProviderKind, name: &str) -> bool {
        self.find_by_name(kind, name).is_some()
    }
}

impl Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tag_formats: Vec<_> = self.tag_writers.keys().collect();
        tag_formats.sort();
        f.debug_struct("CapabilityRegistry")
            .field("decoders", &self.descriptors(ProviderKind::Decoder))
            .field("encoders", &self.descriptors(ProviderKind::Encoder))
            .field("analyzers", &self.descriptors(ProviderKind::Analyzer))
            .field("tag_formats", &tag_formats)
            .finish()
    }
}
