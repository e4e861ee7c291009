/// Embedded cover art
use crate::error::{Result, TimbreError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Cover image attached to a `MetadataRecord`
///
/// Only PNG and JPEG images are accepted. The MIME type and dimensions are
/// read from the image header, never taken on trust from a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverArt {
    data: Vec<u8>,
    mime_type: &'static str,
    width: u32,
    height: u32,
}

impl CoverArt {
    /// Parse cover art from raw image bytes
    ///
    /// # Errors
    /// `InvalidArgument` for empty input, `UnsupportedFormat` for anything
    /// other than PNG or JPEG, `InvalidFormat` if the header is unreadable
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(TimbreError::invalid_argument("cover art data is empty"));
        }

        let reader = ImageReader::new(Cursor::new(data.as_slice())).with_guessed_format()?;
        let mime_type = match reader.format() {
            Some(ImageFormat::Png) => "image/png",
            Some(ImageFormat::Jpeg) => "image/jpeg",
            Some(other) => {
                return Err(TimbreError::unsupported_format(format!(
                    "cover art format {:?}",
                    other
                )))
            }
            None => return Err(TimbreError::unsupported_format("unrecognized cover art")),
        };

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| TimbreError::invalid_format(format!("cover art header: {}", e)))?;

        Ok(Self {
            data,
            mime_type,
            width,
            height,
        })
    }

    /// Parse cover art from a base64 string
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| TimbreError::invalid_format(format!("cover art base64: {}", e)))?;
        Self::from_bytes(data)
    }

    /// Raw image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type ("image/png" or "image/jpeg")
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG is lossless, JPEG is not
    pub fn is_lossless(&self) -> bool {
        self.mime_type == "image/png"
    }

    /// Get the data as a base64-encoded string
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}
