//! Destination directory computation.
//!
//! Media-kind top folder (Photos/, Videos/), then a date bucket derived
//! from the resolved capture date. Dateless files land in "Unsorted".

use super::types::FolderStructure;
use crate::core::record::MediaKind;
use chrono::{DateTime, Datelike, Utc};
use std::path::{Path, PathBuf};

/// Bucket for files with no resolvable capture date
const UNSORTED_FOLDER: &str = "Unsorted";

/// Subfolder duplicates are filed under, beside their original
pub const DUPLICATES_FOLDER: &str = "Duplicates";

/// Compute the destination directory for a file
pub fn destination_dir(
    base: &Path,
    kind: MediaKind,
    date: Option<DateTime<Utc>>,
    structure: FolderStructure,
) -> PathBuf {
    let kind_dir = base.join(kind.folder_name());
    match date {
        Some(date) => kind_dir.join(build_folder_path(structure, date)),
        None => kind_dir.join(UNSORTED_FOLDER),
    }
}

/// Duplicates folder beside an original's resting place
pub fn duplicates_dir_beside(original: &Path) -> PathBuf {
    original
        .parent()
        .map(|p| p.join(DUPLICATES_FOLDER))
        .unwrap_or_else(|| PathBuf::from(DUPLICATES_FOLDER))
}

fn build_folder_path(structure: FolderStructure, date: DateTime<Utc>) -> String {
    let year = date.year();
    let month = date.month();
    let day = date.day();

    let month_name = match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    };

    match structure {
        FolderStructure::YearMonth => {
            format!("{}/{:02} - {}", year, month, month_name)
        }
        FolderStructure::YearMonthDay => {
            format!("{}/{:02}/{:02}", year, month, day)
        }
        FolderStructure::YearMonthFlat => {
            format!("{}-{:02}", year, month)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn year_month_layout() {
        let dir = destination_dir(
            Path::new("/archive"),
            MediaKind::Image,
            Some(date(2024, 1, 15)),
            FolderStructure::YearMonth,
        );
        assert_eq!(dir, PathBuf::from("/archive/Photos/2024/01 - January"));
    }

    #[test]
    fn year_month_day_layout() {
        let dir = destination_dir(
            Path::new("/archive"),
            MediaKind::Video,
            Some(date(2023, 12, 25)),
            FolderStructure::YearMonthDay,
        );
        assert_eq!(dir, PathBuf::from("/archive/Videos/2023/12/25"));
    }

    #[test]
    fn flat_layout() {
        let dir = destination_dir(
            Path::new("/archive"),
            MediaKind::Image,
            Some(date(2024, 6, 1)),
            FolderStructure::YearMonthFlat,
        );
        assert_eq!(dir, PathBuf::from("/archive/Photos/2024-06"));
    }

    #[test]
    fn dateless_files_go_to_unsorted() {
        let dir = destination_dir(
            Path::new("/archive"),
            MediaKind::Image,
            None,
            FolderStructure::YearMonth,
        );
        assert_eq!(dir, PathBuf::from("/archive/Photos/Unsorted"));
    }

    #[test]
    fn duplicates_sit_beside_the_original() {
        let dup = duplicates_dir_beside(Path::new(
            "/archive/Photos/2024/01 - January/photo.jpg",
        ));
        assert_eq!(
            dup,
            PathBuf::from("/archive/Photos/2024/01 - January/Duplicates")
        );
    }
}
