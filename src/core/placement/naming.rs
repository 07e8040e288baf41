//! Collision-safe destination naming.
//!
//! Incoming names are first normalized (OS copy markers stripped), then
//! suffixed with " (1)", " (2)", ... only while a clash remains on disk.

use crate::core::patterns;
use std::path::{Path, PathBuf};

/// Pick a destination path in `dir` for a file currently named `name`.
///
/// The copy-marker-free form of the name is preferred; a numeric suffix
/// is appended only when that exact name is already taken.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let clean = patterns::strip_copy_suffix(name);
    let candidate = dir.join(&clean);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match clean.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (clean.clone(), None),
    };

    let mut counter = 1usize;
    loop {
        let numbered = match &ext {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = dir.join(numbered);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
