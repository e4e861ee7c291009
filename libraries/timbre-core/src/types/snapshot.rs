/// Flat serialized form of a `MetadataRecord`
use super::cover_art::CoverArt;
use super::fields::MetadataField;
use super::metadata::MetadataRecord;
use crate::error::{Result, TimbreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cover art as carried in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoverArtSnapshot {
    /// MIME type detected when the art was loaded (informational)
    pub mime_type: String,
    /// Width in pixels (informational)
    pub width: u32,
    /// Height in pixels (informational)
    pub height: u32,
    /// Image bytes, base64-encoded
    pub data: String,
}

/// Order-independent snapshot for cross-process transfer
///
/// Fields are keyed by their `MetadataField` name. Absent fields are omitted.
/// Converting back into a record re-runs every validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataSnapshot {
    #[serde(flatten)]
    pub fields: BTreeMap<MetadataField, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art: Option<CoverArtSnapshot>,
}

impl From<MetadataRecord> for MetadataSnapshot {
    fn from(record: MetadataRecord) -> Self {
        let fields = record
            .populated_fields()
            .map(|(field, value)| (field, value.to_string()))
            .collect();

        let cover_art = record.cover_art().map(|art| CoverArtSnapshot {
            mime_type: art.mime_type().to_string(),
            width: art.width(),
            height: art.height(),
            data: art.to_base64(),
        });

        Self { fields, cover_art }
    }
}

impl TryFrom<MetadataSnapshot> for MetadataRecord {
    type Error = TimbreError;

    fn try_from(snapshot: MetadataSnapshot) -> Result<Self> {
        let mut record = MetadataRecord::new();
        for (field, value) in &snapshot.fields {
            record.set(*field, value)?;
        }
        if let Some(art) = snapshot.cover_art {
            record.set_cover_art(Some(CoverArt::from_base64(&art.data)?));
        }
        Ok(record)
    }
}

impl MetadataRecord {
    /// Serialize to a JSON snapshot
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from a JSON snapshot
    ///
    /// # Errors
    /// `Serialization` for malformed JSON or an unknown field name,
    /// `MetadataInvalid` for a value that fails its field's validator
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: MetadataSnapshot = serde_json::from_str(json)?;
        MetadataRecord::try_from(snapshot)
    }
}
