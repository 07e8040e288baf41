//! # Record Module
//!
//! The data model for one media file under consideration: its identity on
//! disk, its extracted metadata, and the fingerprints computed for it.
//!
//! A [`FileRecord`] is constructed when a file is visited and mutated in
//! place only by the placement engine (to track its path after a move).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Media classification, derived once from the file extension.
///
/// `Other` files are excluded from duplicate detection entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif", "heic", "heif", "cr2", "arw",
    "nef", "dng", "orf", "raf", "rw2", "pef",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "webm", "m4v", "mts", "3gp",
];

impl MediaKind {
    /// Classify a path by extension
    pub fn from_path(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(e) => e.to_lowercase(),
            None => return Self::Other,
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Other
        }
    }

    /// True for image and video files (the dedup-eligible kinds)
    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Other)
    }

    /// Top-level archive folder for this kind
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Image => "Photos",
            Self::Video => "Videos",
            Self::Other => "Other",
        }
    }
}

/// Metadata extracted from a media container.
///
/// All fields are optional; an all-absent value is a valid result for a
/// file the resolver could not read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Primary capture timestamp (EXIF DateTimeOriginal or container equivalent)
    pub capture_date: Option<DateTime<Utc>>,
    /// Secondary container timestamp (EXIF DateTime)
    pub secondary_date: Option<DateTime<Utc>>,
    /// Timestamp from the GPS track, when present
    pub gps_timestamp: Option<DateTime<Utc>>,
    /// Device make (e.g., "Apple", "Canon")
    pub device_make: Option<String>,
    /// Device model (e.g., "iPhone 15 Pro")
    pub device_model: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
}

impl MediaMetadata {
    /// Check if any metadata was extracted
    pub fn has_data(&self) -> bool {
        self.capture_date.is_some()
            || self.secondary_date.is_some()
            || self.gps_timestamp.is_some()
            || self.device_make.is_some()
            || self.device_model.is_some()
            || self.pixel_width.is_some()
            || self.pixel_height.is_some()
    }

    /// Total pixel area, when both dimensions are known
    pub fn pixel_area(&self) -> Option<u64> {
        match (self.pixel_width, self.pixel_height) {
            (Some(w), Some(h)) => Some(w as u64 * h as u64),
            _ => None,
        }
    }

    /// Get a display string for the device
    pub fn device_display(&self) -> Option<String> {
        match (&self.device_make, &self.device_model) {
            (Some(make), Some(model)) => {
                // Avoid duplication like "Apple Apple iPhone"
                if model.starts_with(make) {
                    Some(model.clone())
                } else {
                    Some(format!("{} {}", make, model))
                }
            }
            (None, Some(model)) => Some(model.clone()),
            (Some(make), None) => Some(make.clone()),
            (None, None) => None,
        }
    }
}

/// One media file under consideration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Current absolute path. Updated only by the placement engine.
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
    /// Filesystem creation time, where the platform reports one
    pub created: Option<SystemTime>,
    pub kind: MediaKind,
    pub metadata: MediaMetadata,
    /// Lowercase hex SHA-256 of the file content, once computed
    pub exact_hash: Option<String>,
    /// 64-bit DCT hash, once computed (images only)
    pub perceptual_hash: Option<u64>,
}

impl FileRecord {
    /// Build a record from a path, reading filesystem metadata.
    ///
    /// Classification happens here, once, and never changes.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            created: meta.created().ok(),
            kind: MediaKind::from_path(path),
            metadata: MediaMetadata::default(),
            exact_hash: None,
            perceptual_hash: None,
        })
    }

    /// File name component, lossy for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Pixel area from extracted metadata
    pub fn pixel_area(&self) -> Option<u64> {
        self.metadata.pixel_area()
    }

    /// Filesystem modified time as a UTC timestamp
    pub fn modified_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.modified)
    }

    /// Filesystem creation time as a UTC timestamp, when available
    pub fn created_utc(&self) -> Option<DateTime<Utc>> {
        self.created.map(DateTime::<Utc>::from)
    }

    /// Record that the file now lives at `new_path`.
    ///
    /// Callers must only do this after the move is confirmed on disk.
    pub fn relocate(&mut self, new_path: PathBuf) {
        self.path = new_path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a.jpg")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("a.JPG")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("a.CR2")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("a.mov")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("a.pdf")), MediaKind::Other);
        assert_eq!(MediaKind::from_path(Path::new("noext")), MediaKind::Other);
    }

    #[test]
    fn other_kind_is_not_media() {
        assert!(MediaKind::Image.is_media());
        assert!(MediaKind::Video.is_media());
        assert!(!MediaKind::Other.is_media());
    }

    #[test]
    fn metadata_default_has_no_data() {
        let meta = MediaMetadata::default();
        assert!(!meta.has_data());
    }

    #[test]
    fn pixel_area_requires_both_dimensions() {
        let mut meta = MediaMetadata::default();
        meta.pixel_width = Some(4000);
        assert_eq!(meta.pixel_area(), None);

        meta.pixel_height = Some(3000);
        assert_eq!(meta.pixel_area(), Some(12_000_000));
    }

    #[test]
    fn device_display_avoids_duplication() {
        let mut meta = MediaMetadata::default();
        meta.device_make = Some("Apple".to_string());
        meta.device_model = Some("Apple iPhone 15 Pro".to_string());
        assert_eq!(meta.device_display(), Some("Apple iPhone 15 Pro".to_string()));
    }

    #[test]
    fn record_from_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"12345").unwrap();

        let record = FileRecord::from_path(&path).unwrap();
        assert_eq!(record.size_bytes, 5);
        assert_eq!(record.kind, MediaKind::Image);
        assert!(record.exact_hash.is_none());
    }

    #[test]
    fn relocate_updates_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();

        let mut record = FileRecord::from_path(&path).unwrap();
        record.relocate(PathBuf::from("/archive/Videos/clip.mp4"));
        assert_eq!(record.path, PathBuf::from("/archive/Videos/clip.mp4"));
    }
}
