//! The placement state machine.
//!
//! Drives one file through fingerprint lookup, staleness checks,
//! quality arbitration, and the physical move, updating the reference
//! index only after moves are confirmed on disk and journaling every
//! mutation along the way.
//!
//! The whole check-then-act sequence for a file runs under its
//! fingerprint's key lock, so two workers racing on one fingerprint
//! cannot both conclude they are the new original.

use super::layout;
use super::naming;
use super::types::{PlacementConfig, PlacementDecision, PlacementOutcome};
use crate::core::arbiter::{self, DuplicatePolicy, Winner};
use crate::core::index::ReferenceIndex;
use crate::core::journal::{OperationRecord, TransactionJournal};
use crate::core::metadata::resolved_capture_date;
use crate::core::record::{FileRecord, MediaKind};
use crate::error::PlacementError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Places files into the archive, arbitrating collisions.
pub struct PlacementEngine {
    config: PlacementConfig,
    index: Arc<ReferenceIndex>,
    journal: Arc<TransactionJournal>,
    /// Serializes destination-name choice with the move that claims it,
    /// so two workers cannot pick one free name
    naming_lock: Mutex<()>,
}

impl PlacementEngine {
    pub fn new(
        config: PlacementConfig,
        index: Arc<ReferenceIndex>,
        journal: Arc<TransactionJournal>,
    ) -> Self {
        Self {
            config,
            index,
            journal,
            naming_lock: Mutex::new(()),
        }
    }

    /// Place one fully fingerprinted record.
    ///
    /// Failures leave the file untouched at its source and never corrupt
    /// the index; callers log them and continue the run.
    pub fn place(&self, record: FileRecord) -> Result<PlacementOutcome, PlacementError> {
        let fingerprint =
            record
                .exact_hash
                .clone()
                .ok_or_else(|| PlacementError::MissingFingerprint {
                    path: record.path.clone(),
                })?;
        if !record.path.exists() {
            return Err(PlacementError::SourceVanished {
                path: record.path.clone(),
            });
        }

        let lock = self.index.key_lock(&fingerprint);
        let _guard = hold(&lock);

        if let Some(current) = self.index.lookup(&fingerprint) {
            return self.handle_collision(record, current, &fingerprint);
        }

        // Exact miss: probe for a visually identical indexed image
        if record.kind == MediaKind::Image {
            if let Some(hash) = record.perceptual_hash {
                if let Some((key, _)) = self.index.find_perceptual_match(hash) {
                    if key != fingerprint {
                        let key_lock = self.index.key_lock(&key);
                        let _key_guard = hold(&key_lock);
                        // Re-read under the lock; the candidate may have
                        // been superseded or gone stale in between
                        if let Some(current) = self.index.lookup(&key) {
                            return self.handle_collision(record, current, &key);
                        }
                    }
                }
            }
        }

        self.place_as_original(record, Some(&fingerprint))
    }

    /// An exact or perceptual hit: decide original vs duplicate under
    /// `key`'s lock.
    fn handle_collision(
        &self,
        incoming: FileRecord,
        current: FileRecord,
        key: &str,
    ) -> Result<PlacementOutcome, PlacementError> {
        // Burst shots and RAW+JPEG siblings are not duplicates at all
        if self.config.policy == DuplicatePolicy::KeepBoth
            || arbiter::is_non_duplicate_pair(&incoming, &current)
        {
            debug!(
                incoming = %incoming.path.display(),
                indexed = %current.path.display(),
                "collision exempt, filing as independent original"
            );
            // Only index the newcomer under its own fingerprint; the
            // existing entry under `key` stands
            let own = incoming.exact_hash.clone();
            let index_key = own.filter(|fp| fp.as_str() != key);
            return self.place_as_original(incoming, index_key.as_deref());
        }

        // The incumbent goes in as the first argument: on a full tie the
        // stable fallback keeps the already-placed original in place
        let arbitration = arbiter::compare(&current, &incoming, self.config.policy);
        match arbitration.winner {
            Winner::First => {
                // The indexed file stays the original; file the newcomer
                // beside it under Duplicates
                let path_before = incoming.path.clone();
                let dup_dir = layout::duplicates_dir_beside(&current.path);
                self.ensure_dir(&dup_dir)?;
                let dest = self.claim_and_move(&incoming.path, &dup_dir, &incoming.file_name())?;

                info!(
                    duplicate = %path_before.display(),
                    original = %current.path.display(),
                    reason = ?arbitration.reason,
                    "filed as duplicate"
                );
                Ok(PlacementOutcome {
                    decision: PlacementDecision::FiledAsDuplicate,
                    path_before,
                    path_after: dest,
                })
            }
            Winner::Second => self.take_over(incoming, current, key, arbitration.reason),
        }
    }

    /// The incoming file won: demote the indexed original to Duplicates,
    /// move the winner into its place, and only then repoint the index.
    fn take_over(
        &self,
        mut incoming: FileRecord,
        current: FileRecord,
        key: &str,
        reason: arbiter::DecisionReason,
    ) -> Result<PlacementOutcome, PlacementError> {
        let path_before = incoming.path.clone();
        let vacated = current.path.clone();

        let dup_dir = layout::duplicates_dir_beside(&vacated);
        self.ensure_dir(&dup_dir)?;
        self.claim_and_move(&current.path, &dup_dir, &current.file_name())?;

        // The original's spot is free now; take it over. If an unrelated
        // worker claimed the name in between, fall back to unique naming
        // in the same directory.
        let dest = {
            let _naming = hold(&self.naming_lock);
            let dest = if vacated.exists() {
                let dir = vacated.parent().unwrap_or(Path::new(""));
                naming::unique_destination(dir, &incoming.file_name())
            } else {
                vacated.clone()
            };
            self.execute_move(&incoming.path, &dest)?;
            dest
        };

        incoming.relocate(dest.clone());
        self.index.insert(key, incoming);

        info!(
            winner = %dest.display(),
            demoted = %vacated.display(),
            reason = ?reason,
            "replaced original"
        );
        Ok(PlacementOutcome {
            decision: PlacementDecision::ReplacedOriginal,
            path_before,
            path_after: dest,
        })
    }

    /// Miss path: move into the dated destination and (optionally)
    /// register in the index afterwards.
    fn place_as_original(
        &self,
        mut record: FileRecord,
        index_key: Option<&str>,
    ) -> Result<PlacementOutcome, PlacementError> {
        let path_before = record.path.clone();
        let date = resolved_capture_date(&record);
        let dir = layout::destination_dir(
            &self.config.destination,
            record.kind,
            date,
            self.config.structure,
        );
        self.ensure_dir(&dir)?;

        let dest = self.claim_and_move(&record.path, &dir, &record.file_name())?;
        record.relocate(dest.clone());

        if let Some(key) = index_key {
            self.index.insert(key, record);
        }

        debug!(from = %path_before.display(), to = %dest.display(), "placed as original");
        Ok(PlacementOutcome {
            decision: PlacementDecision::NewOriginal,
            path_before,
            path_after: dest,
        })
    }

    /// Pick a collision-safe name in `dir` and move the file there, all
    /// under the naming lock.
    fn claim_and_move(
        &self,
        source: &Path,
        dir: &Path,
        name: &str,
    ) -> Result<PathBuf, PlacementError> {
        let _naming = hold(&self.naming_lock);
        let dest = naming::unique_destination(dir, name);
        self.execute_move(source, &dest)?;
        Ok(dest)
    }

    /// Journal, move, confirm, mark completed.
    fn execute_move(&self, source: &Path, dest: &Path) -> Result<(), PlacementError> {
        if !source.exists() {
            return Err(PlacementError::SourceVanished {
                path: source.to_path_buf(),
            });
        }

        let op_id = self
            .journal
            .record(OperationRecord::new_move(
                source.to_path_buf(),
                dest.to_path_buf(),
            ))
            .map_err(PlacementError::Journal)?;

        move_file(source, dest).map_err(|reason| PlacementError::MoveFailed {
            source_path: source.to_path_buf(),
            dest_path: dest.to_path_buf(),
            reason,
        })?;

        // Post-move existence check before anything depends on the file
        // being there
        if !dest.exists() {
            return Err(PlacementError::NotConfirmed {
                path: dest.to_path_buf(),
            });
        }

        self.journal
            .mark_completed(op_id)
            .map_err(PlacementError::Journal)?;
        Ok(())
    }

    /// Create a directory chain, journaling each directory that did not
    /// exist before.
    fn ensure_dir(&self, dir: &Path) -> Result<(), PlacementError> {
        if dir.exists() {
            return Ok(());
        }

        // Parents first, so undo (reverse order) removes leaves first
        let mut missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|p| !p.exists())
            .map(|p| p.to_path_buf())
            .collect();
        missing.reverse();

        fs::create_dir_all(dir).map_err(|e| PlacementError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for created in missing {
            let op_id = self
                .journal
                .record(OperationRecord::new_create_folder(created))
                .map_err(PlacementError::Journal)?;
            self.journal
                .mark_completed(op_id)
                .map_err(PlacementError::Journal)?;
        }
        Ok(())
    }
}

fn hold<'a>(lock: &'a Mutex<()>) -> MutexGuard<'a, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Move with a cross-filesystem fallback: rename, or copy with size
/// verification before the source is deleted.
fn move_file(source: &Path, dest: &Path) -> Result<(), String> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    let source_size = fs::metadata(source).map_err(|e| e.to_string())?.len();
    fs::copy(source, dest).map_err(|e| e.to_string())?;

    let dest_size = fs::metadata(dest).map_err(|e| e.to_string())?.len();
    if dest_size != source_size {
        // Copy was incomplete, don't delete source
        let _ = fs::remove_file(dest);
        return Err(format!(
            "copy verification failed: source {} bytes, dest {} bytes",
            source_size, dest_size
        ));
    }

    fs::remove_file(source).map_err(|e| e.to_string())
}
