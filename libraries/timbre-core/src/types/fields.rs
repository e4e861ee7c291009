//! Metadata field validators
//!
//! Every structured field is stored as a canonical decimal string. The
//! functions here parse caller input, range-check it and render the canonical
//! form. An empty input means "absent" and normalizes to the empty string.

use crate::error::{Result, TimbreError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every field a `MetadataRecord` carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetadataField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Composer,
    Genre,
    Comment,
    Day,
    Month,
    Year,
    TrackNumber,
    TrackCount,
    DiscNumber,
    DiscCount,
    TrackPeak,
    AlbumPeak,
    TrackGain,
    AlbumGain,
}

impl MetadataField {
    /// All fields, in display order
    pub const ALL: [Self; 18] = [
        Self::Title,
        Self::Artist,
        Self::Album,
        Self::AlbumArtist,
        Self::Composer,
        Self::Genre,
        Self::Comment,
        Self::Day,
        Self::Month,
        Self::Year,
        Self::TrackNumber,
        Self::TrackCount,
        Self::DiscNumber,
        Self::DiscCount,
        Self::TrackPeak,
        Self::AlbumPeak,
        Self::TrackGain,
        Self::AlbumGain,
    ];

    /// Field name as used in snapshots and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Artist => "Artist",
            Self::Album => "Album",
            Self::AlbumArtist => "AlbumArtist",
            Self::Composer => "Composer",
            Self::Genre => "Genre",
            Self::Comment => "Comment",
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::TrackNumber => "TrackNumber",
            Self::TrackCount => "TrackCount",
            Self::DiscNumber => "DiscNumber",
            Self::DiscCount => "DiscCount",
            Self::TrackPeak => "TrackPeak",
            Self::AlbumPeak => "AlbumPeak",
            Self::TrackGain => "TrackGain",
            Self::AlbumGain => "AlbumGain",
        }
    }

    /// Look a field up by its name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// Free-text fields accept any string
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            Self::Title
                | Self::Artist
                | Self::Album
                | Self::AlbumArtist
                | Self::Composer
                | Self::Genre
                | Self::Comment
        )
    }

    /// Normalize a value for this field
    ///
    /// # Errors
    /// Returns `MetadataInvalid` when the value fails the field's rules
    pub fn normalize(&self, value: &str) -> Result<String> {
        match self {
            Self::Day => normalize_counter(*self, value, 1, 31),
            Self::Month => normalize_counter(*self, value, 1, 12),
            Self::Year => normalize_year(value),
            Self::TrackNumber | Self::TrackCount | Self::DiscNumber | Self::DiscCount => {
                normalize_counter(*self, value, 1, 99)
            }
            Self::TrackPeak | Self::AlbumPeak => normalize_peak(*self, value),
            Self::TrackGain | Self::AlbumGain => normalize_gain(*self, value),
            _ => Ok(value.to_string()),
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid(field: MetadataField, value: &str) -> TimbreError {
    TimbreError::metadata_invalid(field, value)
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Plain decimal syntax: optional sign, digits, optional fraction
fn is_decimal(value: &str, allow_sign: bool) -> bool {
    let unsigned = match value.as_bytes().first() {
        Some(b'+' | b'-') if allow_sign => &value[1..],
        _ => value,
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };

    match fraction {
        Some(f) => (whole.is_empty() || is_digits(whole)) && is_digits(f),
        None => is_digits(whole),
    }
}

/// Normalize a bounded counter (day, month, track or disc number) to 2 digits
pub fn normalize_counter(field: MetadataField, value: &str, min: u32, max: u32) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    if !is_digits(value) {
        return Err(invalid(field, value));
    }

    let number: u32 = value.parse().map_err(|_| invalid(field, value))?;
    if !(min..=max).contains(&number) {
        return Err(invalid(field, value));
    }

    Ok(format!("{:02}", number))
}

/// Normalize a year: exactly four digits, no leading zero
pub fn normalize_year(value: &str) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    if value.len() != 4 || !is_digits(value) || value.starts_with('0') {
        return Err(invalid(MetadataField::Year, value));
    }
    Ok(value.to_string())
}

/// Normalize a peak magnitude: non-negative, 6 fractional digits
pub fn normalize_peak(field: MetadataField, value: &str) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    if !is_decimal(value, true) || (value.starts_with('-') && has_nonzero_digit(value)) {
        return Err(invalid(field, value));
    }

    Ok(round_decimal(value, PEAK_PLACES))
}

/// Normalize a gain: signed, 2 fractional digits
pub fn normalize_gain(field: MetadataField, value: &str) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    if !is_decimal(value, true) {
        return Err(invalid(field, value));
    }

    Ok(round_decimal(value, GAIN_PLACES))
}

const PEAK_PLACES: usize = 6;
const GAIN_PLACES: usize = 2;

/// Render a peak in canonical form
///
/// Non-finite values render as-is and fail validation.
pub fn format_peak(peak: f64) -> String {
    format_decimal(peak, PEAK_PLACES)
}

/// Render a gain in canonical form
pub fn format_gain(gain: f64) -> String {
    format_decimal(gain, GAIN_PLACES)
}

// f64 Display never uses exponent notation, so finite values are plain decimals
fn format_decimal(value: f64, places: usize) -> String {
    if value.is_finite() {
        round_decimal(&value.to_string(), places)
    } else {
        value.to_string()
    }
}

fn has_nonzero_digit(value: &str) -> bool {
    value.bytes().any(|b| (b'1'..=b'9').contains(&b))
}

/// Round a plain decimal to `places` fraction digits, ties away from zero
///
/// Works on the decimal digits themselves: "2.675" becomes "2.68" even though
/// the nearest f64 is slightly below it. A result of zero carries no sign.
fn round_decimal(value: &str, places: usize) -> String {
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut digits: Vec<u8> = whole
        .bytes()
        .chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(places))
        .map(|b| b - b'0')
        .collect();

    if fraction.as_bytes().get(places).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let split = digits.len() - places;
    let whole = render(&digits[..split]);
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let sign = if negative && digits.iter().any(|d| *d != 0) { "-" } else { "" };

    if places == 0 {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, render(&digits[split..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid(result: Result<String>) -> bool {
        matches!(result, Err(TimbreError::MetadataInvalid { .. }))
    }

    #[test]
    fn day_is_zero_padded() {
        assert_eq!(MetadataField::Day.normalize("1").unwrap(), "01");
        assert_eq!(MetadataField::Day.normalize("31").unwrap(), "31");
        assert_eq!(MetadataField::Day.normalize("09").unwrap(), "09");
    }

    #[test]
    fn day_out_of_range() {
        assert!(is_invalid(MetadataField::Day.normalize("0")));
        assert!(is_invalid(MetadataField::Day.normalize("32")));
        assert!(is_invalid(MetadataField::Day.normalize("Foo")));
        assert!(is_invalid(MetadataField::Day.normalize("-1")));
        assert!(is_invalid(MetadataField::Day.normalize(" 1")));
    }

    #[test]
    fn month_bounds() {
        assert_eq!(MetadataField::Month.normalize("12").unwrap(), "12");
        assert!(is_invalid(MetadataField::Month.normalize("13")));
    }

    #[test]
    fn year_rules() {
        assert_eq!(normalize_year("2017").unwrap(), "2017");
        assert_eq!(normalize_year("1000").unwrap(), "1000");
        for bad in ["999", "10000", "0100", "abcd", "-200", "20 1"] {
            assert!(is_invalid(normalize_year(bad)), "{bad} should be rejected");
        }
    }

    #[test]
    fn track_number_rules() {
        assert_eq!(MetadataField::TrackNumber.normalize("1").unwrap(), "01");
        assert_eq!(MetadataField::TrackCount.normalize("99").unwrap(), "99");
        assert!(is_invalid(MetadataField::TrackNumber.normalize("0")));
        assert!(is_invalid(MetadataField::TrackNumber.normalize("100")));
        assert!(is_invalid(MetadataField::DiscCount.normalize("1.5")));
    }

    #[test]
    fn peak_has_six_fraction_digits() {
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "0.5").unwrap(), "0.500000");
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "1").unwrap(), "1.000000");
        assert_eq!(normalize_peak(MetadataField::AlbumPeak, ".25").unwrap(), "0.250000");
        assert_eq!(
            normalize_peak(MetadataField::TrackPeak, "1.0000004").unwrap(),
            "1.000000"
        );
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "-0").unwrap(), "0.000000");
    }

    #[test]
    fn peak_rejects_negative_and_garbage() {
        assert!(is_invalid(normalize_peak(MetadataField::TrackPeak, "-0.5")));
        assert!(is_invalid(normalize_peak(MetadataField::TrackPeak, "Foo")));
        assert!(is_invalid(normalize_peak(MetadataField::TrackPeak, "inf")));
        assert!(is_invalid(normalize_peak(MetadataField::TrackPeak, "1e3")));
        assert!(is_invalid(normalize_peak(MetadataField::TrackPeak, "1.")));
    }

    #[test]
    fn gain_has_two_fraction_digits() {
        assert_eq!(normalize_gain(MetadataField::TrackGain, "0.7").unwrap(), "0.70");
        assert_eq!(normalize_gain(MetadataField::TrackGain, "+3").unwrap(), "3.00");
        assert_eq!(normalize_gain(MetadataField::AlbumGain, "-6.456").unwrap(), "-6.46");
        assert_eq!(normalize_gain(MetadataField::AlbumGain, "-0.001").unwrap(), "0.00");
        assert!(is_invalid(normalize_gain(MetadataField::TrackGain, "Foo")));
        assert!(is_invalid(normalize_gain(MetadataField::TrackGain, "3 dB")));
    }

    #[test]
    fn ties_round_away_from_zero() {
        let cases = [
            ("1.005", "1.01"),
            ("0.125", "0.13"),
            ("2.675", "2.68"),
            ("-2.675", "-2.68"),
            ("-0.125", "-0.13"),
            ("9.995", "10.00"),
            ("-0.004", "0.00"),
            ("0.1249", "0.12"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_gain(MetadataField::TrackGain, input).unwrap(), expected, "{input}");
        }

        assert_eq!(normalize_peak(MetadataField::TrackPeak, "0.1234565").unwrap(), "0.123457");
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "0.0000015").unwrap(), "0.000002");
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "0.9999995").unwrap(), "1.000000");
        assert_eq!(normalize_peak(MetadataField::TrackPeak, "007.5").unwrap(), "7.500000");
    }

    #[test]
    fn measured_values_use_the_same_rounding() {
        assert_eq!(format_gain(2.675), "2.68");
        assert_eq!(format_gain(-0.001), "0.00");
        assert_eq!(format_gain(-0.0), "0.00");
        assert_eq!(format_peak(0.5), "0.500000");
        assert_eq!(format_peak(1e-7), "0.000000");
        assert!(normalize_peak(MetadataField::TrackPeak, &format_peak(f64::NAN)).is_err());
    }

    #[test]
    fn empty_means_absent() {
        for field in MetadataField::ALL {
            assert_eq!(field.normalize("").unwrap(), "", "{field}");
        }
    }

    #[test]
    fn names_round_trip() {
        for field in MetadataField::ALL {
            assert_eq!(MetadataField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(MetadataField::from_name("title"), None);
    }
}
