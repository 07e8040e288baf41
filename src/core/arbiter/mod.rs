//! # Quality Arbitration
//!
//! Decides, for two files with colliding fingerprints, which is the
//! original and which is the duplicate. The decision is deterministic,
//! total, and symmetric: swapping the arguments swaps the roles.
//!
//! ## Decision Ladder
//! Each step applies only when the previous step ties:
//! 1. Dual superiority - strictly larger byte size AND pixel area wins
//!    immediately, regardless of dates. A re-encoded "original" can carry
//!    an earlier capture date than a rescanned upgrade; sheer size and
//!    resolution superiority is decisive.
//! 2. Byte size - more than 5% apart, the larger file wins.
//! 3. Resolved capture date - earlier wins.
//!    (3.5 for videos: frame pixel area, larger wins.)
//! 4. Filesystem modified time - older wins.
//! 5. Filename cleanliness - the name without an OS copy marker wins.
//! 6. First argument (stable fallback, not an error).
//!
//! Burst sequences and RAW+JPEG pairs are never duplicates; callers
//! consult [`is_non_duplicate_pair`] before arbitrating.

use crate::core::metadata::resolved_capture_date_at;
use crate::core::patterns;
use crate::core::record::{FileRecord, MediaKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Size difference below this fraction of the larger file is a tie
const SIZE_TIE_FRACTION: f64 = 0.05;

/// Duplicate-resolution policy, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The full quality ladder (default)
    #[default]
    Quality,
    /// Larger byte size wins; ladder resolves ties
    KeepLargest,
    /// Earlier capture date wins; ladder resolves ties
    KeepOldest,
    /// Later capture date wins; ladder resolves ties
    KeepNewest,
    /// Never file anything as a duplicate; collisions become independent
    /// originals
    KeepBoth,
}

/// Which argument of `compare` won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    First,
    Second,
}

/// The ladder step that decided the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    DualSuperiority,
    ByteSize,
    CaptureDate,
    FramePixelArea,
    ModifiedTime,
    CleanFilename,
    FirstArgument,
    Policy,
}

/// Outcome of arbitration between two colliding records.
#[derive(Debug, Clone, Copy)]
pub struct Arbitration {
    pub winner: Winner,
    pub reason: DecisionReason,
}

impl Arbitration {
    /// Resolve the winner/loser roles against the original argument pair
    pub fn split<'a>(
        &self,
        first: &'a FileRecord,
        second: &'a FileRecord,
    ) -> (&'a FileRecord, &'a FileRecord) {
        match self.winner {
            Winner::First => (first, second),
            Winner::Second => (second, first),
        }
    }
}

/// True iff the two records are exempt from duplicate handling: a burst
/// pair or a RAW+JPEG sibling pair. Filename-only, no content inspection.
pub fn is_non_duplicate_pair(a: &FileRecord, b: &FileRecord) -> bool {
    let name_a = a.file_name();
    let name_b = b.file_name();
    patterns::is_burst_sequence(&name_a, &name_b) || patterns::is_raw_jpeg_pair(&name_a, &name_b)
}

/// Compare two colliding records under the given policy.
pub fn compare(a: &FileRecord, b: &FileRecord, policy: DuplicatePolicy) -> Arbitration {
    compare_at(a, b, policy, Utc::now())
}

/// Comparison against an explicit "now" for date plausibility (test seam)
pub fn compare_at(
    a: &FileRecord,
    b: &FileRecord,
    policy: DuplicatePolicy,
    now: DateTime<Utc>,
) -> Arbitration {
    let date_a = resolved_capture_date_at(a, now);
    let date_b = resolved_capture_date_at(b, now);

    match policy {
        DuplicatePolicy::Quality | DuplicatePolicy::KeepBoth => {}
        DuplicatePolicy::KeepLargest => {
            if a.size_bytes != b.size_bytes {
                return Arbitration {
                    winner: if a.size_bytes > b.size_bytes {
                        Winner::First
                    } else {
                        Winner::Second
                    },
                    reason: DecisionReason::Policy,
                };
            }
        }
        DuplicatePolicy::KeepOldest => {
            if let (Some(da), Some(db)) = (date_a, date_b) {
                if da != db {
                    return Arbitration {
                        winner: if da < db { Winner::First } else { Winner::Second },
                        reason: DecisionReason::Policy,
                    };
                }
            }
        }
        DuplicatePolicy::KeepNewest => {
            if let (Some(da), Some(db)) = (date_a, date_b) {
                if da != db {
                    return Arbitration {
                        winner: if da > db { Winner::First } else { Winner::Second },
                        reason: DecisionReason::Policy,
                    };
                }
            }
        }
    }

    quality_ladder(a, b, date_a, date_b)
}

fn quality_ladder(
    a: &FileRecord,
    b: &FileRecord,
    date_a: Option<DateTime<Utc>>,
    date_b: Option<DateTime<Utc>>,
) -> Arbitration {
    // 1. Dual superiority
    if let (Some(area_a), Some(area_b)) = (a.pixel_area(), b.pixel_area()) {
        if a.size_bytes > b.size_bytes && area_a > area_b {
            return decided(Winner::First, DecisionReason::DualSuperiority);
        }
        if b.size_bytes > a.size_bytes && area_b > area_a {
            return decided(Winner::Second, DecisionReason::DualSuperiority);
        }
    }

    // 2. Byte size, with a 5% tie band
    let larger = a.size_bytes.max(b.size_bytes);
    let diff = a.size_bytes.abs_diff(b.size_bytes);
    if larger > 0 && (diff as f64) > (larger as f64) * SIZE_TIE_FRACTION {
        return decided(
            if a.size_bytes > b.size_bytes {
                Winner::First
            } else {
                Winner::Second
            },
            DecisionReason::ByteSize,
        );
    }

    // 3. Resolved capture date, earlier wins
    if let (Some(da), Some(db)) = (date_a, date_b) {
        if da != db {
            return decided(
                if da < db { Winner::First } else { Winner::Second },
                DecisionReason::CaptureDate,
            );
        }
    }

    // 3.5. Videos: frame pixel area breaks the size+date tie
    if a.kind == MediaKind::Video && b.kind == MediaKind::Video {
        if let (Some(area_a), Some(area_b)) = (a.pixel_area(), b.pixel_area()) {
            if area_a != area_b {
                return decided(
                    if area_a > area_b {
                        Winner::First
                    } else {
                        Winner::Second
                    },
                    DecisionReason::FramePixelArea,
                );
            }
        }
    }

    // 4. Filesystem modified time, older wins
    if a.modified != b.modified {
        return decided(
            if a.modified < b.modified {
                Winner::First
            } else {
                Winner::Second
            },
            DecisionReason::ModifiedTime,
        );
    }

    // 5. Filename cleanliness
    let a_marked = patterns::has_copy_pattern(&a.file_name());
    let b_marked = patterns::has_copy_pattern(&b.file_name());
    if a_marked != b_marked {
        return decided(
            if b_marked { Winner::First } else { Winner::Second },
            DecisionReason::CleanFilename,
        );
    }

    // 6. Stable fallback
    decided(Winner::First, DecisionReason::FirstArgument)
}

fn decided(winner: Winner, reason: DecisionReason) -> Arbitration {
    Arbitration { winner, reason }
}
