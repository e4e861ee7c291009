//! Metadata record
//!
//! A `MetadataRecord` owns every descriptive field of one audio item. Structured
//! fields go through their validator on assignment, so a record never holds a
//! non-canonical value. A failed assignment leaves the previous value in place.

use super::cover_art::CoverArt;
use super::fields::{format_gain, format_peak, MetadataField};
use super::snapshot::MetadataSnapshot;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Descriptive metadata for one audio item
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MetadataSnapshot", into = "MetadataSnapshot")]
pub struct MetadataRecord {
    title: String,
    artist: String,
    album: String,
    album_artist: String,
    composer: String,
    genre: String,
    comment: String,
    day: String,
    month: String,
    year: String,
    track_number: String,
    track_count: String,
    disc_number: String,
    disc_count: String,
    track_peak: String,
    album_peak: String,
    track_gain: String,
    album_gain: String,
    cover_art: Option<CoverArt>,
}

macro_rules! text_accessors {
    ($($field:ident, $setter:ident;)*) => {
        $(
            #[doc = concat!("The `", stringify!($field), "` field (empty when absent)")]
            pub fn $field(&self) -> &str {
                &self.$field
            }

            #[doc = concat!("Set the `", stringify!($field), "` field")]
            pub fn $setter(&mut self, value: impl Into<String>) {
                self.$field = value.into();
            }
        )*
    };
}

macro_rules! structured_accessors {
    ($($field:ident, $setter:ident, $kind:expr;)*) => {
        $(
            #[doc = concat!("The `", stringify!($field), "` field in canonical form (empty when absent)")]
            pub fn $field(&self) -> &str {
                &self.$field
            }

            #[doc = concat!("Validate, normalize and store the `", stringify!($field), "` field")]
            ///
            /// # Errors
            /// `MetadataInvalid` if the value fails validation; the field is unchanged
            pub fn $setter(&mut self, value: &str) -> Result<()> {
                self.$field = $kind.normalize(value)?;
                Ok(())
            }
        )*
    };
}

impl MetadataRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    text_accessors! {
        title, set_title;
        artist, set_artist;
        album, set_album;
        album_artist, set_album_artist;
        composer, set_composer;
        genre, set_genre;
        comment, set_comment;
    }

    structured_accessors! {
        day, set_day, MetadataField::Day;
        month, set_month, MetadataField::Month;
        year, set_year, MetadataField::Year;
        track_number, set_track_number, MetadataField::TrackNumber;
        track_count, set_track_count, MetadataField::TrackCount;
        disc_number, set_disc_number, MetadataField::DiscNumber;
        disc_count, set_disc_count, MetadataField::DiscCount;
        track_peak, set_track_peak, MetadataField::TrackPeak;
        album_peak, set_album_peak, MetadataField::AlbumPeak;
        track_gain, set_track_gain, MetadataField::TrackGain;
        album_gain, set_album_gain, MetadataField::AlbumGain;
    }

    /// Read any field by name
    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Title => &self.title,
            MetadataField::Artist => &self.artist,
            MetadataField::Album => &self.album,
            MetadataField::AlbumArtist => &self.album_artist,
            MetadataField::Composer => &self.composer,
            MetadataField::Genre => &self.genre,
            MetadataField::Comment => &self.comment,
            MetadataField::Day => &self.day,
            MetadataField::Month => &self.month,
            MetadataField::Year => &self.year,
            MetadataField::TrackNumber => &self.track_number,
            MetadataField::TrackCount => &self.track_count,
            MetadataField::DiscNumber => &self.disc_number,
            MetadataField::DiscCount => &self.disc_count,
            MetadataField::TrackPeak => &self.track_peak,
            MetadataField::AlbumPeak => &self.album_peak,
            MetadataField::TrackGain => &self.track_gain,
            MetadataField::AlbumGain => &self.album_gain,
        }
    }

    /// Assign any field by name, running its validator
    ///
    /// # Errors
    /// `MetadataInvalid` if a structured field rejects the value
    pub fn set(&mut self, field: MetadataField, value: &str) -> Result<()> {
        let normalized = field.normalize(value)?;
        *self.slot_mut(field) = normalized;
        Ok(())
    }

    fn slot_mut(&mut self, field: MetadataField) -> &mut String {
        match field {
            MetadataField::Title => &mut self.title,
            MetadataField::Artist => &mut self.artist,
            MetadataField::Album => &mut self.album,
            MetadataField::AlbumArtist => &mut self.album_artist,
            MetadataField::Composer => &mut self.composer,
            MetadataField::Genre => &mut self.genre,
            MetadataField::Comment => &mut self.comment,
            MetadataField::Day => &mut self.day,
            MetadataField::Month => &mut self.month,
            MetadataField::Year => &mut self.year,
            MetadataField::TrackNumber => &mut self.track_number,
            MetadataField::TrackCount => &mut self.track_count,
            MetadataField::DiscNumber => &mut self.disc_number,
            MetadataField::DiscCount => &mut self.disc_count,
            MetadataField::TrackPeak => &mut self.track_peak,
            MetadataField::AlbumPeak => &mut self.album_peak,
            MetadataField::TrackGain => &mut self.track_gain,
            MetadataField::AlbumGain => &mut self.album_gain,
        }
    }

    /// Store a measured track peak (linear) and gain (dB)
    pub fn set_track_replaygain(&mut self, peak: f64, gain_db: f64) -> Result<()> {
        let peak = MetadataField::TrackPeak.normalize(&format_peak(peak))?;
        let gain = MetadataField::TrackGain.normalize(&format_gain(gain_db))?;
        self.track_peak = peak;
        self.track_gain = gain;
        Ok(())
    }

    /// Store a measured album peak (linear) and gain (dB)
    pub fn set_album_replaygain(&mut self, peak: f64, gain_db: f64) -> Result<()> {
        let peak = MetadataField::AlbumPeak.normalize(&format_peak(peak))?;
        let gain = MetadataField::AlbumGain.normalize(&format_gain(gain_db))?;
        self.album_peak = peak;
        self.album_gain = gain;
        Ok(())
    }

    /// Remove all peak and gain fields
    pub fn clear_replaygain(&mut self) {
        self.track_peak.clear();
        self.album_peak.clear();
        self.track_gain.clear();
        self.album_gain.clear();
    }

    /// Embedded cover art, if any
    pub fn cover_art(&self) -> Option<&CoverArt> {
        self.cover_art.as_ref()
    }

    /// Replace or remove the embedded cover art
    pub fn set_cover_art(&mut self, cover_art: Option<CoverArt>) {
        self.cover_art = cover_art;
    }

    /// Fields that currently hold a value
    pub fn populated_fields(&self) -> impl Iterator<Item = (MetadataField, &str)> + '_ {
        MetadataField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
            .filter(|(_, value)| !value.is_empty())
    }

    /// True when no field and no cover art is set
    pub fn is_empty(&self) -> bool {
        self.populated_fields().next().is_none() && self.cover_art.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimbreError;

    #[test]
    fn structured_setter_normalizes() {
        let mut record = MetadataRecord::new();
        record.set_day("7").unwrap();
        record.set_track_peak("0.5").unwrap();
        record.set_track_gain("0.7").unwrap();

        assert_eq!(record.day(), "07");
        assert_eq!(record.track_peak(), "0.500000");
        assert_eq!(record.track_gain(), "0.70");
    }

    #[test]
    fn failed_set_keeps_previous_value() {
        let mut record = MetadataRecord::new();
        record.set_year("2017").unwrap();

        let err = record.set_year("0100").unwrap_err();
        assert!(matches!(
            err,
            TimbreError::MetadataInvalid { field: MetadataField::Year, ref value } if value == "0100"
        ));
        assert_eq!(record.year(), "2017");
    }

    #[test]
    fn generic_set_matches_typed_setters() {
        let mut by_name = MetadataRecord::new();
        let mut typed = MetadataRecord::new();

        by_name.set(MetadataField::TrackNumber, "3").unwrap();
        by_name.set(MetadataField::Title, "Test Title").unwrap();
        typed.set_track_number("3").unwrap();
        typed.set_title("Test Title");

        assert_eq!(by_name, typed);
        assert_eq!(by_name.get(MetadataField::TrackNumber), "03");
    }

    #[test]
    fn replaygain_helpers_round_values() {
        let mut record = MetadataRecord::new();
        record.set_track_replaygain(0.123_456_78, -6.789).unwrap();
        assert_eq!(record.track_peak(), "0.123457");
        assert_eq!(record.track_gain(), "-6.79");

        record.set_album_replaygain(1.2, 52.0).unwrap();
        assert_eq!(record.album_peak(), "1.200000");
        assert_eq!(record.album_gain(), "52.00");

        record.clear_replaygain();
        assert!(record.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut original = MetadataRecord::new();
        original.set_artist("Artist");
        let snapshot = original.clone();

        original.set_artist("Changed");
        assert_ne!(original, snapshot);
        assert_eq!(snapshot.artist(), "Artist");
    }

    #[test]
    fn populated_fields_skip_empty() {
        let mut record = MetadataRecord::new();
        record.set_album("Album");
        record.set_month("2").unwrap();

        let fields: Vec<_> = record.populated_fields().collect();
        assert_eq!(
            fields,
            vec![(MetadataField::Album, "Album"), (MetadataField::Month, "02")]
        );
    }
}
