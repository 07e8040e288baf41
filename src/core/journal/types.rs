//! Types for the transaction journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Kind of filesystem mutation recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Move,
    Copy,
    Delete,
    CreateFolder,
}

/// One durable, immutable-once-written journal entry.
///
/// Appended when the filesystem effect is intended; `completed` is set
/// only after the effect is confirmed on disk. Undo skips any record
/// that is not marked completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: Uuid,
    pub kind: OperationKind,
    pub source: PathBuf,
    /// Absent for operations without a second path (DELETE, CREATE_FOLDER)
    pub destination: Option<PathBuf>,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

impl OperationRecord {
    fn new(kind: OperationKind, source: PathBuf, destination: Option<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source,
            destination,
            completed: false,
            timestamp: Utc::now(),
        }
    }

    pub fn new_move(source: PathBuf, destination: PathBuf) -> Self {
        Self::new(OperationKind::Move, source, Some(destination))
    }

    pub fn new_copy(source: PathBuf, destination: PathBuf) -> Self {
        Self::new(OperationKind::Copy, source, Some(destination))
    }

    pub fn new_delete(path: PathBuf) -> Self {
        Self::new(OperationKind::Delete, path, None)
    }

    pub fn new_create_folder(path: PathBuf) -> Self {
        Self::new(OperationKind::CreateFolder, path, None)
    }
}

/// One run's ordered group of operations, persisted as a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Timestamp-derived identifier, unique per base directory
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub operations: Vec<OperationRecord>,
}

impl Session {
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            id: started_at.format("%Y%m%d-%H%M%S%3f").to_string(),
            started_at,
            operations: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_operations_start_uncompleted() {
        let op = OperationRecord::new_move(
            PathBuf::from("/inbox/a.jpg"),
            PathBuf::from("/archive/a.jpg"),
        );
        assert!(!op.completed);
        assert_eq!(op.kind, OperationKind::Move);
        assert!(op.destination.is_some());
    }

    #[test]
    fn folder_operations_have_no_destination() {
        let op = OperationRecord::new_create_folder(PathBuf::from("/archive/2024"));
        assert_eq!(op.kind, OperationKind::CreateFolder);
        assert!(op.destination.is_none());
    }

    #[test]
    fn session_ids_are_timestamp_shaped() {
        let session = Session::new();
        // YYYYMMDD-HHMMSSmmm
        assert_eq!(session.id.len(), 18);
        assert!(session.id.chars().nth(8) == Some('-'));
    }

    #[test]
    fn operation_roundtrips_through_json() {
        let op = OperationRecord::new_copy(
            PathBuf::from("/inbox/a.jpg"),
            PathBuf::from("/archive/a.jpg"),
        );
        let json = serde_json::to_string(&op).unwrap();
        let back: OperationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, op.id);
        assert_eq!(back.kind, OperationKind::Copy);
    }
}
