//! Analysis and encoding orchestration for Timbre
//!
//! Orchestrators sit between a host and a populated `CapabilityRegistry`:
//! they resolve providers by name, validate settings against the provider's
//! schema and decide how items are processed.
//!
//! - `AnalysisOrchestrator`: solo, group (album) and batch analysis
//! - `EncodingOrchestrator`: encode then tag
//! - `open_item` / `save_metadata`: extension-based decoder and tag writer lookup
//! - `HostConfig`: `timbre.toml` plus `TIMBRE_*` environment configuration

#![deny(unsafe_code)]

mod analysis;
mod cancel;
pub mod config;
mod encoding;
mod error;
mod open;

pub use analysis::{AnalysisOrchestrator, AnalysisReport};
pub use cancel::CancellationToken;
pub use config::HostConfig;
pub use encoding::{destination_for, EncodingOrchestrator};
pub use error::ConfigError;
pub use open::{open_item, save_metadata};
