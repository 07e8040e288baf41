//! # Checkpoint Module
//!
//! Optional resume support: a small JSON file under the target directory
//! recording which source paths a run has already processed. A rerun
//! with resume enabled skips them instead of re-hashing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CHECKPOINT_FILE: &str = ".organizer-checkpoint.json";

/// Processed-file state of an interrupted or finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub processed_count: usize,
    pub processed: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            processed_count: 0,
            processed: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn mark(&mut self, path: PathBuf) {
        self.processed.push(path);
        self.processed_count = self.processed.len();
        self.updated_at = Utc::now();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.processed.iter().any(|p| p == path)
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new()
    }
}

fn checkpoint_path(target_dir: &Path) -> PathBuf {
    target_dir.join(CHECKPOINT_FILE)
}

/// Load the checkpoint for a target directory, if one exists.
///
/// A corrupted checkpoint is discarded with a warning; resume support is
/// best-effort and never blocks a run.
pub fn load(target_dir: &Path) -> Option<Checkpoint> {
    let path = checkpoint_path(target_dir);
    let json = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&json) {
        Ok(checkpoint) => Some(checkpoint),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable checkpoint");
            None
        }
    }
}

/// Persist the checkpoint by atomic rewrite
pub fn save(target_dir: &Path, checkpoint: &Checkpoint) -> std::io::Result<()> {
    let path = checkpoint_path(target_dir);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(checkpoint)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)
}

/// Remove a finished run's checkpoint
pub fn clear(target_dir: &Path) {
    let _ = fs::remove_file(checkpoint_path(target_dir));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();

        let mut checkpoint = Checkpoint::new();
        checkpoint.mark(PathBuf::from("/inbox/a.jpg"));
        checkpoint.mark(PathBuf::from("/inbox/b.jpg"));
        save(dir.path(), &checkpoint).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.processed_count, 2);
        assert!(loaded.contains(Path::new("/inbox/a.jpg")));
        assert!(!loaded.contains(Path::new("/inbox/c.jpg")));
    }

    #[test]
    fn missing_checkpoint_loads_as_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).is_none());
    }

    #[test]
    fn corrupted_checkpoint_is_discarded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CHECKPOINT_FILE), "{ nope").unwrap();
        assert!(load(dir.path()).is_none());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = TempDir::new().unwrap();
        save(dir.path(), &Checkpoint::new()).unwrap();
        clear(dir.path());
        assert!(load(dir.path()).is_none());
    }
}
