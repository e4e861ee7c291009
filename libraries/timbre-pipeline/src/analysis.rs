//! Analysis orchestration
//!
//! Resolves an analyzer by name, validates the caller's settings against its
//! schema, then picks the solo or group path from the number of items:
//!
//! ```text
//! 1 item    measure ──────────────────────────────► track fields
//! N items   measure ∥ measure ∥ ... ──► barrier ──► aggregate ──► track + album fields
//! ```
//!
//! Group measurement runs on the rayon pool. Nothing is written to any member
//! until every measurement and the aggregation have succeeded.

use crate::cancel::CancellationToken;
use rayon::prelude::*;
use std::sync::Arc;
use timbre_core::{
    AlbumAnalysis, AudioAnalyzer, AudioItem, CapabilityRegistry, MetadataRecord, ProviderKind,
    Result, SettingsMap, TimbreError, TrackAnalysis, TrackMeasurement, ValidatedSettings,
};
use tracing::{debug, info, warn};

/// Results of one `analyze` call, in item order
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub tracks: Vec<TrackAnalysis>,
    /// Present only for groups of two or more items
    pub album: Option<AlbumAnalysis>,
}

/// Runs analyzers from a registry over audio items
#[derive(Debug, Clone)]
pub struct AnalysisOrchestrator {
    registry: Arc<CapabilityRegistry>,
    cancel: CancellationToken,
}

impl AnalysisOrchestrator {
    /// Create an orchestrator over a populated registry
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token checked between items
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    fn prepare(
        &self,
        provider: &str,
        settings: &SettingsMap,
    ) -> Result<(Arc<dyn AudioAnalyzer>, ValidatedSettings)> {
        let registered = self.registry.resolve(ProviderKind::Analyzer, provider)?;
        let analyzer = registered.analyzer().cloned().ok_or_else(|| {
            TimbreError::ProviderContract(format!("{} is not an analyzer", provider))
        })?;
        let validated = registered.descriptor.schema.validate(settings)?;
        Ok((analyzer, validated))
    }

    /// Analyze `items` with the named provider and write the results into
    /// each item's metadata
    ///
    /// One item gets track fields only; its album fields are left as they
    /// were. Two or more items are treated as a group and every member gets
    /// both track and album fields.
    ///
    /// A group is all or nothing. A member the analyzer cannot measure, such
    /// as one whose sample rate is outside 8 to 384 kHz for ReplayGain, fails
    /// the whole group; use `analyze_batch` to measure members independently.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty item list
    /// - `UnsupportedProvider`, `UnsupportedSetting`, `InvalidSettingValue`
    ///   before any item is touched
    /// - `Cancelled` if the token was cancelled before work started
    /// - the first member failure of a group, in which case no record is modified
    pub fn analyze(
        &self,
        provider: &str,
        settings: &SettingsMap,
        items: &mut [AudioItem],
    ) -> Result<AnalysisReport> {
        if items.is_empty() {
            return Err(TimbreError::invalid_argument("no items to analyze"));
        }
        let (analyzer, settings) = self.prepare(provider, settings)?;
        if self.cancel.is_cancelled() {
            return Err(TimbreError::Cancelled);
        }

        info!("Analyzing {} item(s) with {}", items.len(), provider);
        if items.len() == 1 {
            let track = analyze_solo(analyzer.as_ref(), &settings, &mut items[0])?;
            return Ok(AnalysisReport {
                tracks: vec![track],
                album: None,
            });
        }

        analyze_group(analyzer.as_ref(), &settings, items)
    }

    /// Analyze independent items, each on its own
    ///
    /// Items run in parallel. A failing item does not affect its siblings.
    /// Items not yet started when the token is cancelled report `Cancelled`.
    ///
    /// # Errors
    /// The outer error covers provider resolution and settings validation,
    /// which apply to the whole batch.
    pub fn analyze_batch(
        &self,
        provider: &str,
        settings: &SettingsMap,
        items: &mut [AudioItem],
    ) -> Result<Vec<Result<TrackAnalysis>>> {
        let (analyzer, settings) = self.prepare(provider, settings)?;
        info!("Analyzing batch of {} item(s) with {}", items.len(), provider);

        let results: Vec<Result<TrackAnalysis>> = items
            .par_iter_mut()
            .map(|item| {
                if self.cancel.is_cancelled() {
                    return Err(TimbreError::Cancelled);
                }
                analyze_solo(analyzer.as_ref(), &settings, item)
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!("{} of {} batch item(s) failed", failed, results.len());
        }
        Ok(results)
    }
}

fn analyze_solo(
    analyzer: &dyn AudioAnalyzer,
    settings: &ValidatedSettings,
    item: &mut AudioItem,
) -> Result<TrackAnalysis> {
    let measurement = analyzer.measure(item.source.as_mut(), settings)?;
    let track = measurement.track;
    item.metadata.set_track_replaygain(track.peak, track.gain_db)?;
    debug!("Track peak {:.6}, gain {:.2} dB", track.peak, track.gain_db);
    Ok(track)
}

fn analyze_group(
    analyzer: &dyn AudioAnalyzer,
    settings: &ValidatedSettings,
    items: &mut [AudioItem],
) -> Result<AnalysisReport> {
    // Barrier: every member is measured before anything is aggregated
    let measurements = items
        .par_iter_mut()
        .map(|item| analyzer.measure(item.source.as_mut(), settings))
        .collect::<Result<Vec<TrackMeasurement>>>()?;

    let album = analyzer.aggregate(&measurements, settings)?;

    // Build every updated record first so a formatting failure leaves all
    // members untouched
    let updated = items
        .iter()
        .zip(&measurements)
        .map(|(item, m)| -> Result<MetadataRecord> {
            let mut record = item.metadata.clone();
            record.set_track_replaygain(m.track.peak, m.track.gain_db)?;
            record.set_album_replaygain(album.peak, album.gain_db)?;
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    for (item, record) in items.iter_mut().zip(updated) {
        item.metadata = record;
    }

    debug!("Album peak {:.6}, gain {:.2} dB", album.peak, album.gain_db);
    Ok(AnalysisReport {
        tracks: measurements.iter().map(|m| m.track).collect(),
        album: Some(album),
    })
}
