//! Undo engine: reverse replay of a persisted session.
//!
//! Operations are processed in reverse chronological order. Records not
//! marked completed never had a confirmed filesystem effect and are
//! skipped. Each reversal succeeds or fails on its own; the aggregate
//! report carries both counts. Session files are left in place either
//! way, so a partially failed undo can be retried.

use super::store;
use super::types::{OperationKind, OperationRecord};
use crate::error::UndoError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Aggregate outcome of undoing one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoReport {
    pub session_id: String,
    /// True iff every eligible operation was reversed
    pub success: bool,
    pub undone_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    /// First failure message, for presentation layers
    pub error: Option<String>,
}

/// Reverses persisted sessions.
pub struct UndoEngine;

impl UndoEngine {
    /// Undo one session under `base_dir`.
    ///
    /// Fails outright only if the session cannot be loaded; individual
    /// reversal failures are counted in the report.
    pub fn undo(session_id: &str, base_dir: &Path) -> Result<UndoReport, UndoError> {
        let session = store::load_session(session_id, base_dir).map_err(|source| {
            UndoError::SessionUnavailable {
                id: session_id.to_string(),
                source,
            }
        })?;

        let mut undone = 0usize;
        let mut failed = 0usize;
        let mut skipped = 0usize;
        let mut first_error: Option<String> = None;

        for op in session.operations.iter().rev() {
            if !op.completed {
                skipped += 1;
                continue;
            }

            match Self::revert(op) {
                Ok(()) => undone += 1,
                Err(message) => {
                    warn!(op = ?op.kind, source = %op.source.display(), %message, "undo failed");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(message);
                    }
                }
            }
        }

        info!(session_id, undone, failed, skipped, "undo finished");

        Ok(UndoReport {
            session_id: session_id.to_string(),
            success: failed == 0,
            undone_count: undone,
            failed_count: failed,
            skipped_count: skipped,
            error: first_error,
        })
    }

    fn revert(op: &OperationRecord) -> Result<(), String> {
        match op.kind {
            OperationKind::Move => {
                let current = op
                    .destination
                    .as_ref()
                    .ok_or_else(|| "move record without destination".to_string())?;
                if !current.exists() {
                    return Err(format!(
                        "file to restore no longer exists: {}",
                        current.display()
                    ));
                }
                if let Some(parent) = op.source.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| format!("cannot recreate {}: {}", parent.display(), e))?;
                }
                move_back(current, &op.source)
            }
            OperationKind::Copy => {
                let copy = op
                    .destination
                    .as_ref()
                    .ok_or_else(|| "copy record without destination".to_string())?;
                if copy.exists() {
                    fs::remove_file(copy)
                        .map_err(|e| format!("cannot remove {}: {}", copy.display(), e))?;
                }
                Ok(())
            }
            OperationKind::CreateFolder => {
                // Only remove what is now empty; anything else was
                // repopulated since and stays
                if op.source.is_dir() {
                    match fs::read_dir(&op.source) {
                        Ok(mut entries) => {
                            if entries.next().is_none() {
                                let _ = fs::remove_dir(&op.source);
                            }
                        }
                        Err(e) => {
                            return Err(format!(
                                "cannot inspect {}: {}",
                                op.source.display(),
                                e
                            ))
                        }
                    }
                }
                Ok(())
            }
            OperationKind::Delete => Err(format!(
                "delete operations cannot be reversed: {}",
                op.source.display()
            )),
        }
    }
}

/// Move a file back to its recorded source, with a cross-device
/// copy+verify+delete fallback mirroring the forward path.
fn move_back(from: &Path, to: &Path) -> Result<(), String> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let from_size = fs::metadata(from).map_err(|e| e.to_string())?.len();
    fs::copy(from, to).map_err(|e| e.to_string())?;
    let to_size = fs::metadata(to).map_err(|e| e.to_string())?.len();
    if to_size != from_size {
        let _ = fs::remove_file(to);
        return Err(format!(
            "copy verification failed: source {} bytes, dest {} bytes",
            from_size, to_size
        ));
    }
    fs::remove_file(from).map_err(|e| e.to_string())
}
