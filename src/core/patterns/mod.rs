//! # Pattern Classifier
//!
//! Pure, filename-only predicates that suppress false-positive duplicate
//! flags:
//! - burst sequences (consecutive shutter counters are distinct shots)
//! - RAW+JPEG sibling pairs (one shot, two container formats)
//! - OS-generated copy suffixes (" - Copy", "(2)", "_copy_1", ...)
//!
//! None of these inspect file content.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// RAW container extensions recognized for sibling-pair detection
const RAW_EXTENSIONS: &[&str] = &["cr2", "arw", "nef", "dng", "orf", "raf", "rw2", "pef"];

/// JPEG extensions recognized for sibling-pair detection
const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Split a stem into its prefix and trailing numeric run
fn split_trailing_digits(stem: &str) -> (&str, &str) {
    let boundary = stem
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    stem.split_at(boundary)
}

/// True iff the two filenames look like consecutive shots from a burst:
/// same non-numeric prefix, trailing counters exactly 1 apart.
pub fn is_burst_sequence(a: &str, b: &str) -> bool {
    let (stem_a, _) = split_name(a);
    let (stem_b, _) = split_name(b);

    let (prefix_a, digits_a) = split_trailing_digits(stem_a);
    let (prefix_b, digits_b) = split_trailing_digits(stem_b);

    if digits_a.is_empty() || digits_b.is_empty() {
        return false;
    }
    if prefix_a.is_empty() || !prefix_a.eq_ignore_ascii_case(prefix_b) {
        return false;
    }

    let (na, nb) = match (digits_a.parse::<u64>(), digits_b.parse::<u64>()) {
        (Ok(na), Ok(nb)) => (na, nb),
        _ => return false,
    };

    na.abs_diff(nb) == 1
}

/// True iff the two filenames form a RAW+JPEG pair from one shot: same
/// base name (case-insensitive), one RAW extension, one JPEG extension.
/// Argument order is irrelevant.
pub fn is_raw_jpeg_pair(a: &str, b: &str) -> bool {
    let (stem_a, ext_a) = split_name(a);
    let (stem_b, ext_b) = split_name(b);

    let (ext_a, ext_b) = match (ext_a, ext_b) {
        (Some(ea), Some(eb)) => (ea.to_lowercase(), eb.to_lowercase()),
        _ => return false,
    };

    if !stem_a.eq_ignore_ascii_case(stem_b) {
        return false;
    }

    let a_raw = RAW_EXTENSIONS.contains(&ext_a.as_str());
    let b_raw = RAW_EXTENSIONS.contains(&ext_b.as_str());
    let a_jpeg = JPEG_EXTENSIONS.contains(&ext_a.as_str());
    let b_jpeg = JPEG_EXTENSIONS.contains(&ext_b.as_str());

    (a_raw && b_jpeg) || (a_jpeg && b_raw)
}

fn dash_copy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.*?)\s-\scopy(?:\s\(\d+\))?$").unwrap())
}

fn word_copy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // " copy 2", " copy2", "_copy_2", "_copy"
    RE.get_or_init(|| Regex::new(r"(?i)^(.*?)[\s_]copy[\s_]?\d*$").unwrap())
}

fn glued_copy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.*?)copy\d+$").unwrap())
}

fn paren_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s?\(\d+\)$").unwrap())
}

/// Normalize a filename by stripping OS-generated duplicate markers, in
/// documented order. The extension is preserved as-is.
///
/// Numeric runs of 3+ digits are original identifiers (camera counters)
/// and are never stripped.
pub fn strip_copy_suffix(name: &str) -> String {
    let (stem, ext) = split_name(name);
    let mut result = stem.to_string();

    if let Some(caps) = dash_copy_re().captures(&result) {
        result = caps[1].to_string();
    }
    if let Some(caps) = word_copy_re().captures(&result) {
        result = caps[1].to_string();
    }
    if let Some(caps) = glued_copy_re().captures(&result) {
        // "IMG_001copy2" is a marker; "photocopy2" is a word that happens
        // to end in copy
        let base = caps[1].to_string();
        let glued_to_word = base
            .chars()
            .last()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(true);
        if !glued_to_word {
            result = base;
        }
    }
    if let Some(caps) = paren_number_re().captures(&result) {
        result = caps[1].to_string();
    }

    // Bare numeric suffix: strip only short (1-2 digit) runs
    let (prefix, digits) = split_trailing_digits(&result);
    if !prefix.is_empty() && (1..=2).contains(&digits.len()) {
        result = prefix.trim_end_matches([' ', '_', '-']).to_string();
    }

    if result.is_empty() {
        // Nothing left after stripping; the original name stands
        result = stem.to_string();
    }

    match ext {
        Some(ext) => format!("{}.{}", result, ext),
        None => result,
    }
}

/// True iff the filename carries any OS copy marker
pub fn has_copy_pattern(name: &str) -> bool {
    strip_copy_suffix(name) != name
}

/// Convenience wrapper for paths
pub fn path_has_copy_pattern(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(has_copy_pattern)
        .unwrap_or(false)
}
