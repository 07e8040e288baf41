//! Event type definitions for progress reporting.

use crate::core::placement::PlacementDecision;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by an organize run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level events
    Run(RunEvent),
    /// Per-file events
    File(FileEvent),
}

/// Run-level lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The file stream has been enumerated
    Started { total_files: usize },
    /// Progress update
    Progress(RunProgress),
    /// The run was cancelled between files
    Cancelled,
    /// The run finished
    Completed(RunSummary),
}

/// Progress information during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgress {
    pub completed: usize,
    pub total: usize,
    pub current_path: PathBuf,
}

/// Per-file outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileEvent {
    /// A file was placed; one of these fires for every move the run makes
    Placed {
        path_before: PathBuf,
        path_after: PathBuf,
        decision: PlacementDecision,
    },
    /// A file was left alone (not a media file, or already processed)
    Skipped { path: PathBuf, reason: String },
    /// A file could not be processed; it stays at its source
    Failed { path: PathBuf, message: String },
}

/// Aggregate result of one organize run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub session_id: String,
    pub total_files: usize,
    pub new_originals: usize,
    pub replaced_originals: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}
