//! The `ReplayGain` analyzer provider

use crate::analyzer::{measure_source, PeakAnalysis, TrackLoudness};
use crate::error::LoudnessError;
use crate::replaygain::ReplayGainCalculator;
use timbre_core::{
    AlbumAnalysis, AudioAnalyzer, CapabilityDescriptor, Result, SampleSource, SettingsSchema,
    TimbreError, TrackMeasurement, ValidatedSettings,
};

/// Analyzer computing ReplayGain 2.0 track and album values
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayGainAnalyzer {
    calculator: ReplayGainCalculator,
}

impl ReplayGainAnalyzer {
    /// Registered provider name
    pub const NAME: &'static str = "ReplayGain";

    /// Settings key selecting the peak strategy
    pub const PEAK_ANALYSIS: &'static str = "PeakAnalysis";

    /// Create an analyzer with the -18 LUFS reference
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings this analyzer accepts
    pub fn schema() -> SettingsSchema {
        SettingsSchema::new().with_text_choices(Self::PEAK_ANALYSIS, PeakAnalysis::CHOICES)
    }

    /// Registry descriptor
    pub fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(Self::NAME, "ReplayGain 2.0 loudness and peak analysis")
            .with_schema(Self::schema())
    }

    fn peak_analysis(settings: &ValidatedSettings) -> PeakAnalysis {
        settings
            .text(Self::PEAK_ANALYSIS)
            .and_then(PeakAnalysis::from_name)
            .unwrap_or_default()
    }
}

impl AudioAnalyzer for ReplayGainAnalyzer {
    fn measure(
        &self,
        source: &mut dyn SampleSource,
        settings: &ValidatedSettings,
    ) -> Result<TrackMeasurement> {
        let loudness = measure_source(source, Self::peak_analysis(settings))?;
        Ok(TrackMeasurement {
            track: self.calculator.track(&loudness),
            detail: Box::new(loudness),
        })
    }

    fn aggregate(
        &self,
        members: &[TrackMeasurement],
        _settings: &ValidatedSettings,
    ) -> Result<AlbumAnalysis> {
        let tracks = members
            .iter()
            .map(|m| {
                m.detail
                    .downcast_ref::<TrackLoudness>()
                    .ok_or(LoudnessError::ForeignMeasurement)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.calculator
            .album(&tracks)
            .map_err(TimbreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use timbre_core::{AudioFormat, MemorySampleSource, SampleRate, SettingValue, TrackAnalysis};

    fn source(amplitude: f32) -> MemorySampleSource {
        let samples = (0..44_100)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin())
            .collect();
        MemorySampleSource::new(samples, AudioFormat::new(SampleRate::CD_QUALITY, 1, 16)).unwrap()
    }

    fn settings(peak: &str) -> ValidatedSettings {
        let mut map = HashMap::new();
        map.insert(
            ReplayGainAnalyzer::PEAK_ANALYSIS.to_string(),
            SettingValue::Text(peak.to_string()),
        );
        ReplayGainAnalyzer::schema().validate(&map).unwrap()
    }

    #[test]
    fn test_descriptor() {
        let descriptor = ReplayGainAnalyzer::descriptor();
        assert_eq!(descriptor.name, "ReplayGain");
        assert!(descriptor.schema.get("PeakAnalysis").is_some());
        assert_eq!(descriptor.schema.len(), 1);
    }

    #[test]
    fn test_schema_rejects_unknown_mode() {
        let mut map = HashMap::new();
        map.insert("PeakAnalysis".to_string(), SettingValue::from("Foo"));
        assert!(matches!(
            ReplayGainAnalyzer::schema().validate(&map),
            Err(TimbreError::InvalidSettingValue { .. })
        ));
    }

    #[test]
    fn test_interpolated_not_below_simple() {
        let analyzer = ReplayGainAnalyzer::new();
        let simple = analyzer
            .measure(&mut source(0.9), &settings("Simple"))
            .unwrap();
        let interpolated = analyzer
            .measure(&mut source(0.9), &settings("Interpolated"))
            .unwrap();
        assert!(interpolated.track.peak >= simple.track.peak);
        assert!((interpolated.track.gain_db - simple.track.gain_db).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_rejects_foreign_measurement() {
        let analyzer = ReplayGainAnalyzer::new();
        let foreign = TrackMeasurement {
            track: TrackAnalysis::default(),
            detail: Box::new(42_u32),
        };
        let err = analyzer
            .aggregate(&[foreign], &ValidatedSettings::empty())
            .unwrap_err();
        assert!(matches!(err, TimbreError::ProviderContract(_)));
    }

    #[test]
    fn test_aggregate_album_peak() {
        let analyzer = ReplayGainAnalyzer::new();
        let settings = ValidatedSettings::empty();
        let members = vec![
            analyzer.measure(&mut source(0.3), &settings).unwrap(),
            analyzer.measure(&mut source(0.6), &settings).unwrap(),
        ];
        let album = analyzer.aggregate(&members, &settings).unwrap();
        assert_eq!(album.peak, members[1].track.peak);
    }
}
