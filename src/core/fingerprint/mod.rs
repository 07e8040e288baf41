//! # Fingerprint Module
//!
//! Two fingerprints per file:
//! - `exact` - streaming SHA-256 of the full byte content, the primary
//!   duplicate key
//! - `perceptual` - 64-bit DCT hash of image pixel content, for
//!   near-duplicate detection when exact hashes differ
//!
//! `decode` provides the shared fast image-decode path.

pub mod decode;
pub mod exact;
pub mod perceptual;

pub use exact::hash_file;
pub use perceptual::{are_similar, hamming_distance, SIMILARITY_THRESHOLD};
