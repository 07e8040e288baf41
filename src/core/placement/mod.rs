//! # Placement Module
//!
//! Computes target directories, performs atomic move-with-unique-naming,
//! and drives quality arbitration when a fingerprint collision is found.
//! The reference index is updated only after moves are confirmed on disk;
//! every mutation goes through the transaction journal.
//!
//! - `layout` - destination folder computation
//! - `naming` - collision-safe unique naming
//! - `engine` - the per-file placement state machine

pub mod engine;
pub mod layout;
pub mod naming;
pub mod types;

pub use engine::PlacementEngine;
pub use types::{FolderStructure, PlacementConfig, PlacementDecision, PlacementOutcome};
