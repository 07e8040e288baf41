//! # Metadata Module
//!
//! Extracts metadata from media containers and resolves the single
//! "capture date" used for placement and quality arbitration.
//!
//! ## Resolver Contract
//! [`MetadataResolver`] never fails for unsupported formats: a file the
//! resolver cannot read yields an all-absent [`MediaMetadata`]. Absence
//! feeds the date/quality fallbacks; it is not an error.
//!
//! ## Capture Date Resolution
//! Priority: GPS timestamp > primary capture timestamp > secondary
//! container timestamp > filesystem creation time > filesystem modified
//! time. Dates before 2000 or more than a year in the future are treated
//! as implausible and discarded before comparison.

use crate::core::record::{FileRecord, MediaKind, MediaMetadata};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Source of metadata for media files.
///
/// Implementations must never fail for unsupported formats; they signal
/// "no data" through absent fields instead.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, path: &Path, kind: MediaKind) -> MediaMetadata;
}

/// Default resolver backed by EXIF container data.
#[derive(Debug, Default)]
pub struct ExifResolver;

impl MetadataResolver for ExifResolver {
    fn resolve(&self, path: &Path, kind: MediaKind) -> MediaMetadata {
        // Video containers rarely carry EXIF; the attempt is still safe
        // and harmless for the ones that do (e.g. some MOV files).
        let _ = kind;
        extract_exif(path)
    }
}

/// Extract EXIF metadata from a file, returning defaults on any failure
fn extract_exif(path: &Path) -> MediaMetadata {
    let mut metadata = MediaMetadata::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return metadata,
    };

    let mut bufreader = BufReader::new(&file);
    let exif_reader = match Reader::new().read_from_container(&mut bufreader) {
        Ok(r) => r,
        Err(_) => return metadata,
    };

    if let Some(field) = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        metadata.capture_date = parse_datetime_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::DateTime, In::PRIMARY) {
        metadata.secondary_date = parse_datetime_value(&field.value);
    }

    // Prefer actual pixel dimensions, fall back to image width/height tags
    if let Some(field) = exif_reader.get_field(Tag::PixelXDimension, In::PRIMARY) {
        metadata.pixel_width = get_u32_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::PixelYDimension, In::PRIMARY) {
        metadata.pixel_height = get_u32_value(&field.value);
    }
    if metadata.pixel_width.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageWidth, In::PRIMARY) {
            metadata.pixel_width = get_u32_value(&field.value);
        }
    }
    if metadata.pixel_height.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageLength, In::PRIMARY) {
            metadata.pixel_height = get_u32_value(&field.value);
        }
    }

    if let Some(field) = exif_reader.get_field(Tag::Make, In::PRIMARY) {
        metadata.device_make = get_string_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::Model, In::PRIMARY) {
        metadata.device_model = get_string_value(&field.value);
    }

    metadata.gps_lat = get_gps_coordinate(
        &exif_reader,
        Tag::GPSLatitude,
        Tag::GPSLatitudeRef,
        "S",
    );
    metadata.gps_lon = get_gps_coordinate(
        &exif_reader,
        Tag::GPSLongitude,
        Tag::GPSLongitudeRef,
        "W",
    );
    metadata.gps_timestamp = get_gps_timestamp(&exif_reader);

    metadata
}

/// Parse an EXIF ASCII datetime value ("YYYY:MM:DD HH:MM:SS")
fn parse_datetime_value(value: &Value) -> Option<DateTime<Utc>> {
    let s = get_string_value(value)?;
    let naive = NaiveDateTime::parse_from_str(&s, "%Y:%m:%d %H:%M:%S").ok()?;
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

/// Read a GPS coordinate as signed decimal degrees
fn get_gps_coordinate(
    reader: &exif::Exif,
    coord_tag: Tag,
    ref_tag: Tag,
    negative_ref: &str,
) -> Option<f64> {
    let field = reader.get_field(coord_tag, In::PRIMARY)?;
    let rationals = match &field.value {
        Value::Rational(vec) if vec.len() >= 3 => vec,
        _ => return None,
    };

    let degrees = rationals[0].to_f64();
    let minutes = rationals[1].to_f64();
    let seconds = rationals[2].to_f64();
    let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    if let Some(r) = reader.get_field(ref_tag, In::PRIMARY) {
        if get_string_value(&r.value).as_deref() == Some(negative_ref) {
            decimal = -decimal;
        }
    }

    Some(decimal)
}

/// Combine GPSDateStamp + GPSTimeStamp into a UTC timestamp
fn get_gps_timestamp(reader: &exif::Exif) -> Option<DateTime<Utc>> {
    let date_field = reader.get_field(Tag::GPSDateStamp, In::PRIMARY)?;
    let date_str = get_string_value(&date_field.value)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y:%m:%d").ok()?;

    let time_field = reader.get_field(Tag::GPSTimeStamp, In::PRIMARY)?;
    let rationals = match &time_field.value {
        Value::Rational(vec) if vec.len() >= 3 => vec,
        _ => return None,
    };
    let naive = date.and_hms_opt(
        rationals[0].to_f64() as u32,
        rationals[1].to_f64() as u32,
        rationals[2].to_f64() as u32,
    )?;

    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// True if a date falls within the sane window: not before year 2000, not
/// more than one year in the future.
pub fn is_plausible_date(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date.year() >= 2000 && date <= now + Duration::days(365)
}

/// Resolve the single capture date for a record, applying the priority
/// ladder and the plausibility window.
pub fn resolved_capture_date(record: &FileRecord) -> Option<DateTime<Utc>> {
    resolved_capture_date_at(record, Utc::now())
}

/// Ladder evaluation against an explicit "now" (test seam)
pub fn resolved_capture_date_at(
    record: &FileRecord,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let candidates = [
        record.metadata.gps_timestamp,
        record.metadata.capture_date,
        record.metadata.secondary_date,
        record.created_utc(),
        Some(record.modified_utc()),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|d| is_plausible_date(*d, now))
}
