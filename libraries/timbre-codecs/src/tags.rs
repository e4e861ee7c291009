//! Tag reading and writing with lofty
//!
//! Maps between `MetadataRecord` fields and lofty's format-neutral
//! `ItemKey`s, so one implementation covers ID3v2 (MP3, WAV), Vorbis
//! comments (FLAC, Ogg, Opus) and MP4 atoms:
//! - ReplayGain values go to the `REPLAYGAIN_*` items, gains with a " dB" suffix
//! - Day, month and year share one recording date item ("YYYY-MM-DD")
//! - Cover art is stored as the front cover picture

use crate::error::{CodecError, Result};
use lofty::{ItemKey, Picture, PictureType, Probe, Tag, TagExt, TaggedFileExt};
use std::io::Cursor;
use std::path::Path;
use timbre_core::{CoverArt, MetadataField, MetadataRecord, TagWriter};
use tracing::{debug, warn};

/// Extensions lofty can tag
pub const TAGGABLE_EXTENSIONS: [&str; 6] = ["wav", "flac", "mp3", "m4a", "ogg", "opus"];

/// lofty item for each field stored as its own item
fn item_key(field: MetadataField) -> Option<ItemKey> {
    let key = match field {
        MetadataField::Title => ItemKey::TrackTitle,
        MetadataField::Artist => ItemKey::TrackArtist,
        MetadataField::Album => ItemKey::AlbumTitle,
        MetadataField::AlbumArtist => ItemKey::AlbumArtist,
        MetadataField::Composer => ItemKey::Composer,
        MetadataField::Genre => ItemKey::Genre,
        MetadataField::Comment => ItemKey::Comment,
        MetadataField::TrackNumber => ItemKey::TrackNumber,
        MetadataField::TrackCount => ItemKey::TrackTotal,
        MetadataField::DiscNumber => ItemKey::DiscNumber,
        MetadataField::DiscCount => ItemKey::DiscTotal,
        MetadataField::TrackPeak => ItemKey::ReplayGainTrackPeak,
        MetadataField::AlbumPeak => ItemKey::ReplayGainAlbumPeak,
        MetadataField::TrackGain => ItemKey::ReplayGainTrackGain,
        MetadataField::AlbumGain => ItemKey::ReplayGainAlbumGain,
        MetadataField::Day | MetadataField::Month | MetadataField::Year => return None,
    };
    Some(key)
}

/// Parse a gain value from a tag (e.g., "-5.23 dB" -> "-5.23")
fn strip_gain_suffix(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_suffix("dB").unwrap_or(value);
    value.trim()
}

/// Clean up a raw tag value for `field` before validation
fn tag_value(field: MetadataField, raw: &str) -> String {
    match field {
        MetadataField::TrackGain | MetadataField::AlbumGain => strip_gain_suffix(raw).to_string(),
        MetadataField::TrackPeak | MetadataField::AlbumPeak => raw.trim().to_string(),
        // "3/12" style numbering
        MetadataField::TrackNumber
        | MetadataField::TrackCount
        | MetadataField::DiscNumber
        | MetadataField::DiscCount => raw.split('/').next().unwrap_or(raw).trim().to_string(),
        _ => raw.to_string(),
    }
}

fn assign(record: &mut MetadataRecord, field: MetadataField, value: &str, path: &Path) {
    if let Err(e) = record.set(field, value) {
        warn!("Skipping {} tag in {:?}: {}", field, path, e);
    }
}

/// Split "YYYY", "YYYY-MM" or "YYYY-MM-DD[...]" into its parts
fn split_date(date: &str) -> (Option<&str>, Option<&str>, Option<&str>) {
    let date = date.trim();
    let date = date.get(..10).unwrap_or(date);
    let mut parts = date.split('-');
    (parts.next(), parts.next(), parts.next())
}

fn join_date(record: &MetadataRecord) -> Option<String> {
    if record.year().is_empty() {
        return None;
    }
    let mut date = record.year().to_string();
    if !record.month().is_empty() {
        date.push('-');
        date.push_str(record.month());
        if !record.day().is_empty() {
            date.push('-');
            date.push_str(record.day());
        }
    }
    Some(date)
}

/// Extract a `MetadataRecord` from a lofty tag
///
/// Values that fail validation are skipped with a warning.
pub fn metadata_from_tag(tag: &Tag, path: &Path) -> MetadataRecord {
    let mut record = MetadataRecord::new();

    for field in MetadataField::ALL {
        let Some(key) = item_key(field) else { continue };
        if let Some(raw) = tag.get_string(&key) {
            assign(&mut record, field, &tag_value(field, raw), path);
        }
    }

    let date = tag
        .get_string(&ItemKey::RecordingDate)
        .or_else(|| tag.get_string(&ItemKey::Year));
    if let Some(date) = date {
        let (year, month, day) = split_date(date);
        // Only keep month and day if the year was accepted
        if let Some(year) = year {
            assign(&mut record, MetadataField::Year, year, path);
        }
        if !record.year().is_empty() {
            if let Some(month) = month {
                assign(&mut record, MetadataField::Month, month, path);
            }
            if let Some(day) = day.filter(|_| !record.month().is_empty()) {
                assign(&mut record, MetadataField::Day, day, path);
            }
        }
    }

    let picture = tag
        .pictures()
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| tag.pictures().first());
    if let Some(picture) = picture {
        match CoverArt::from_bytes(picture.data().to_vec()) {
            Ok(art) => record.set_cover_art(Some(art)),
            Err(e) => warn!("Skipping cover art in {:?}: {}", path, e),
        }
    }

    record
}

/// Read tags from an audio file into a `MetadataRecord`
///
/// A file without tags yields an empty record.
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<MetadataRecord> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CodecError::FileNotFound(path.display().to_string()));
    }

    let tagged_file = Probe::open(path)?.read()?;

    // Try primary tag first, then any other tag present
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.tags().first());
    let record = tag.map_or_else(MetadataRecord::new, |t| metadata_from_tag(t, path));

    debug!("Read {} tag fields from {:?}", record.populated_fields().count(), path);
    Ok(record)
}

/// Build a new lofty tag of `tag_type` holding `record`
pub fn tag_from_metadata(record: &MetadataRecord, tag_type: lofty::TagType) -> Result<Tag> {
    let mut tag = Tag::new(tag_type);

    for (field, value) in record.populated_fields() {
        let Some(key) = item_key(field) else { continue };
        let value = match field {
            MetadataField::TrackGain | MetadataField::AlbumGain => format!("{} dB", value),
            _ => value.to_string(),
        };
        tag.insert_text(key, value);
    }

    if let Some(date) = join_date(record) {
        tag.insert_text(ItemKey::RecordingDate, date);
    }

    if let Some(art) = record.cover_art() {
        let mut picture = Picture::from_reader(&mut Cursor::new(art.data()))?;
        picture.set_pic_type(PictureType::CoverFront);
        tag.push_picture(picture);
    }

    Ok(tag)
}

/// Write a `MetadataRecord` into a file's native tag
///
/// The file's existing tag of the primary type is replaced.
pub fn write_metadata<P: AsRef<Path>>(path: P, record: &MetadataRecord) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CodecError::FileNotFound(path.display().to_string()));
    }

    let tagged_file = Probe::open(path)?.read()?;
    let tag = tag_from_metadata(record, tagged_file.primary_tag_type())?;

    tag.save_to_path(path)
        .map_err(|e: lofty::error::LoftyError| CodecError::TagError(e.to_string()))?;

    debug!("Wrote tags to {:?}", path);
    Ok(())
}

/// `TagWriter` backed by lofty
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    /// Create a new tag writer
    pub fn new() -> Self {
        Self
    }
}

impl TagWriter for LoftyTagWriter {
    fn write(&self, path: &Path, metadata: &MetadataRecord) -> timbre_core::Result<()> {
        write_metadata(path, metadata).map_err(Into::into)
    }
}
