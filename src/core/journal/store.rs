//! Session persistence for the transaction journal.
//!
//! One JSON file per session under `<base>/transactions/`, rewritten
//! whole (temp file + rename) every N appended operations and at session
//! end. Records are never rewritten once their session file is final;
//! undo never deletes session files.

use super::types::{OperationRecord, Session};
use crate::error::JournalError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Operations appended between automatic flushes
pub const DEFAULT_FLUSH_INTERVAL: usize = 10;

const TRANSACTIONS_DIR: &str = "transactions";

struct JournalState {
    session: Session,
    appended_since_flush: usize,
}

/// Durable, thread-safe journal for one session.
pub struct TransactionJournal {
    state: Mutex<JournalState>,
    session_path: PathBuf,
    flush_interval: usize,
}

impl TransactionJournal {
    /// Begin a fresh session under `base_dir`, creating the transactions
    /// directory and the session file.
    pub fn start_session(base_dir: &Path) -> Result<Self, JournalError> {
        Self::start_session_with_interval(base_dir, DEFAULT_FLUSH_INTERVAL)
    }

    pub fn start_session_with_interval(
        base_dir: &Path,
        flush_interval: usize,
    ) -> Result<Self, JournalError> {
        let dir = transactions_dir(base_dir);
        fs::create_dir_all(&dir).map_err(|e| JournalError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let session = Session::new();
        let session_path = dir.join(format!("{}.json", session.id));

        let journal = Self {
            state: Mutex::new(JournalState {
                session,
                appended_since_flush: 0,
            }),
            session_path,
            flush_interval: flush_interval.max(1),
        };
        // An empty session file marks the run as started even if it is
        // interrupted before the first flush
        journal.flush()?;
        Ok(journal)
    }

    pub fn session_id(&self) -> String {
        self.lock_state().session.id.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, JournalState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an operation, persisting the session when the group-commit
    /// interval is reached. Returns the operation id for later
    /// completion marking.
    pub fn record(&self, op: OperationRecord) -> Result<Uuid, JournalError> {
        let mut state = self.lock_state();
        let id = op.id;
        debug!(op = ?op.kind, source = %op.source.display(), "journal append");
        state.session.operations.push(op);
        state.appended_since_flush += 1;

        if state.appended_since_flush >= self.flush_interval {
            self.write_snapshot(&state.session)?;
            state.appended_since_flush = 0;
        }
        Ok(id)
    }

    /// Mark a previously recorded operation as completed.
    ///
    /// Only completed operations are eligible for undo.
    pub fn mark_completed(&self, id: Uuid) -> Result<(), JournalError> {
        let mut state = self.lock_state();
        match state.session.operations.iter_mut().find(|op| op.id == id) {
            Some(op) => op.completed = true,
            None => warn!(%id, "completion mark for unknown operation"),
        }
        Ok(())
    }

    /// Persist the current session state unconditionally
    pub fn flush(&self) -> Result<(), JournalError> {
        let mut state = self.lock_state();
        self.write_snapshot(&state.session)?;
        state.appended_since_flush = 0;
        Ok(())
    }

    /// Final flush at the end of a run
    pub fn end_session(&self) -> Result<String, JournalError> {
        self.flush()?;
        Ok(self.session_id())
    }

    /// Atomic whole-file rewrite: serialize to a sibling temp file, then
    /// rename over the session file. Callers hold the state lock, so a
    /// snapshot can never interleave with an append.
    fn write_snapshot(&self, session: &Session) -> Result<(), JournalError> {
        let json =
            serde_json::to_string_pretty(session).map_err(|e| JournalError::Serialize {
                id: session.id.clone(),
                reason: e.to_string(),
            })?;

        let tmp_path = self.session_path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| JournalError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        fs::rename(&tmp_path, &self.session_path).map_err(|e| JournalError::Io {
            path: self.session_path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

/// The transactions directory for a base directory
pub fn transactions_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(TRANSACTIONS_DIR)
}

/// Enumerate persisted session ids under a base directory, newest first.
pub fn list_sessions(base_dir: &Path) -> Result<Vec<String>, JournalError> {
    let dir = transactions_dir(base_dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&dir).map_err(|e| JournalError::Io {
        path: dir.clone(),
        source: e,
    })?;

    let mut ids: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.strip_suffix(".json").map(|id| id.to_string())
        })
        .collect();

    ids.sort();
    ids.reverse();
    Ok(ids)
}

/// Load one persisted session by id.
pub fn load_session(id: &str, base_dir: &Path) -> Result<Session, JournalError> {
    let path = transactions_dir(base_dir).join(format!("{}.json", id));
    if !path.exists() {
        return Err(JournalError::SessionNotFound { id: id.to_string() });
    }

    let json = fs::read_to_string(&path).map_err(|e| JournalError::Io {
        path: path.clone(),
        source: e,
    })?;

    serde_json::from_str(&json).map_err(|e| JournalError::Corrupted {
        path,
        reason: e.to_string(),
    })
}
