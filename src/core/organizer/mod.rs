//! # Organizer Run Loop
//!
//! Drives a whole run: enumerate the file stream, then classify, hash,
//! and place each file on a bounded worker pool. The reference index is
//! the only state shared across workers; every per-file failure is
//! isolated, logged, and counted.
//!
//! Cancellation is cooperative: the flag is checked between files, and
//! in-flight files finish before the pool drains (moves are atomic at
//! the filesystem level, so there are no partial moves to clean up).

use crate::core::arbiter::DuplicatePolicy;
use crate::core::checkpoint;
use crate::core::fingerprint::{exact, perceptual};
use crate::core::index::ReferenceIndex;
use crate::core::journal::TransactionJournal;
use crate::core::metadata::{ExifResolver, MetadataResolver};
use crate::core::placement::{
    FolderStructure, PlacementConfig, PlacementDecision, PlacementEngine, PlacementOutcome,
};
use crate::core::record::{FileRecord, MediaKind};
use crate::error::{OrganizerError, Result};
use crate::events::{Event, EventSender, FileEvent, RunEvent, RunProgress, RunSummary};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Configuration for one organize run
#[derive(Debug, Clone)]
pub struct OrganizeRunConfig {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    pub structure: FolderStructure,
    pub policy: DuplicatePolicy,
    /// Skip files a previous interrupted run already processed
    pub resume: bool,
}

impl OrganizeRunConfig {
    pub fn new(sources: Vec<PathBuf>, destination: PathBuf) -> Self {
        Self {
            sources,
            destination,
            structure: FolderStructure::default(),
            policy: DuplicatePolicy::default(),
            resume: false,
        }
    }
}

enum ProcessResult {
    Placed(PlacementOutcome),
    Skipped(String),
}

/// Runs the organize pipeline.
pub struct Organizer {
    config: OrganizeRunConfig,
    resolver: Arc<dyn MetadataResolver>,
}

impl Organizer {
    pub fn new(config: OrganizeRunConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(ExifResolver),
        }
    }

    /// Swap in a different metadata source (tests, container-specific
    /// resolvers)
    pub fn with_resolver(config: OrganizeRunConfig, resolver: Arc<dyn MetadataResolver>) -> Self {
        Self { config, resolver }
    }

    /// Execute the run. Only total inability to access the destination
    /// is fatal; everything per-file is counted and reported.
    pub fn run(&self, cancel: &AtomicBool, events: &EventSender) -> Result<RunSummary> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.destination).map_err(|e| {
            OrganizerError::TargetInaccessible {
                path: self.config.destination.clone(),
                source: e,
            }
        })?;

        let previous = if self.config.resume {
            checkpoint::load(&self.config.destination)
        } else {
            None
        };
        let already_done: Vec<PathBuf> = previous
            .as_ref()
            .map(|c| c.processed.clone())
            .unwrap_or_default();

        let files = self.enumerate_files(&already_done);
        events.send(Event::Run(RunEvent::Started {
            total_files: files.len(),
        }));
        info!(total = files.len(), "organize run starting");

        let journal = Arc::new(TransactionJournal::start_session(&self.config.destination)?);
        let session_id = journal.session_id();
        let index = Arc::new(ReferenceIndex::new());
        let engine = PlacementEngine::new(
            PlacementConfig {
                destination: self.config.destination.clone(),
                structure: self.config.structure,
                policy: self.config.policy,
            },
            Arc::clone(&index),
            Arc::clone(&journal),
        );

        let new_originals = AtomicUsize::new(0);
        let replaced = AtomicUsize::new(0);
        let duplicates = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let was_cancelled = AtomicBool::new(false);
        // Accumulate onto a resumed checkpoint so repeated interruptions
        // keep their history
        let progress_checkpoint = Mutex::new(previous.unwrap_or_default());

        let total = files.len();
        files.par_iter().for_each(|path| {
            if cancel.load(Ordering::Relaxed) {
                was_cancelled.store(true, Ordering::Relaxed);
                return;
            }

            match self.process_file(path, &engine) {
                Ok(ProcessResult::Placed(outcome)) => {
                    match outcome.decision {
                        PlacementDecision::NewOriginal => {
                            new_originals.fetch_add(1, Ordering::Relaxed)
                        }
                        PlacementDecision::ReplacedOriginal => {
                            replaced.fetch_add(1, Ordering::Relaxed)
                        }
                        PlacementDecision::FiledAsDuplicate => {
                            duplicates.fetch_add(1, Ordering::Relaxed)
                        }
                    };
                    events.send(Event::File(FileEvent::Placed {
                        path_before: outcome.path_before,
                        path_after: outcome.path_after,
                        decision: outcome.decision,
                    }));
                }
                Ok(ProcessResult::Skipped(reason)) => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    events.send(Event::File(FileEvent::Skipped {
                        path: path.clone(),
                        reason,
                    }));
                }
                Err(message) => {
                    warn!(path = %path.display(), %message, "file left unresolved");
                    failed.fetch_add(1, Ordering::Relaxed);
                    events.send(Event::File(FileEvent::Failed {
                        path: path.clone(),
                        message,
                    }));
                }
            }

            progress_checkpoint
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .mark(path.clone());

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            events.send(Event::Run(RunEvent::Progress(RunProgress {
                completed: done,
                total,
                current_path: path.clone(),
            })));
        });

        journal.end_session()?;

        let cancelled = was_cancelled.load(Ordering::Relaxed);
        let checkpoint = progress_checkpoint
            .into_inner()
            .unwrap_or_else(|p| p.into_inner());
        if cancelled {
            // Leave a resume point behind
            if let Err(e) = checkpoint::save(&self.config.destination, &checkpoint) {
                warn!(error = %e, "could not persist checkpoint");
            }
        } else {
            checkpoint::clear(&self.config.destination);
        }

        let summary = RunSummary {
            session_id,
            total_files: total,
            new_originals: new_originals.into_inner(),
            replaced_originals: replaced.into_inner(),
            duplicates: duplicates.into_inner(),
            skipped: skipped.into_inner(),
            failed: failed.into_inner(),
            cancelled,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if cancelled {
            events.send(Event::Run(RunEvent::Cancelled));
        }
        events.send(Event::Run(RunEvent::Completed(summary.clone())));
        info!(
            session = %summary.session_id,
            originals = summary.new_originals,
            duplicates = summary.duplicates,
            failed = summary.failed,
            "organize run finished"
        );

        Ok(summary)
    }

    /// Walk the source trees, skipping paths a resumed run already
    /// handled.
    fn enumerate_files(&self, already_done: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for source in &self.config.sources {
            for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                if already_done.iter().any(|p| p == &path) {
                    debug!(path = %path.display(), "skipping checkpointed file");
                    continue;
                }
                files.push(path);
            }
        }
        files
    }

    /// Classify, resolve metadata, fingerprint, and place one file.
    fn process_file(
        &self,
        path: &Path,
        engine: &PlacementEngine,
    ) -> std::result::Result<ProcessResult, String> {
        let mut record = FileRecord::from_path(path).map_err(|e| e.to_string())?;

        if !record.kind.is_media() {
            return Ok(ProcessResult::Skipped("not a media file".to_string()));
        }

        record.metadata = self.resolver.resolve(path, record.kind);
        record.exact_hash = Some(exact::hash_file(path).map_err(|e| e.to_string())?);

        if record.kind == MediaKind::Image {
            // A decode failure is "no perceptual signal", not an error
            record.perceptual_hash = match perceptual::hash_image(path) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "no perceptual signal");
                    None
                }
            };
        }

        let outcome = engine.place(record).map_err(|e| e.to_string())?;
        Ok(ProcessResult::Placed(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use tempfile::TempDir;

    fn setup_sources(dir: &TempDir) -> PathBuf {
        let inbox = dir.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        inbox
    }

    fn run_config(dir: &TempDir, inbox: &Path) -> OrganizeRunConfig {
        OrganizeRunConfig::new(vec![inbox.to_path_buf()], dir.path().join("archive"))
    }

    #[test]
    fn run_places_files_and_files_duplicates() {
        let dir = TempDir::new().unwrap();
        let inbox = setup_sources(&dir);
        fs::write(inbox.join("a.jpg"), b"unique pixels").unwrap();
        fs::write(inbox.join("b.jpg"), b"same pixels").unwrap();
        fs::write(inbox.join("c.jpg"), b"same pixels").unwrap();
        fs::write(inbox.join("notes.txt"), b"not media").unwrap();

        let organizer = Organizer::new(run_config(&dir, &inbox));
        let summary = organizer
            .run(&AtomicBool::new(false), &null_sender())
            .unwrap();

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.new_originals, 2);
        // The later twin is either filed as a duplicate or wins the
        // takeover, depending on worker order
        assert_eq!(summary.duplicates + summary.replaced_originals, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert!(!summary.cancelled);
    }

    #[test]
    fn pre_cancelled_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let inbox = setup_sources(&dir);
        fs::write(inbox.join("a.jpg"), b"pixels").unwrap();

        let organizer = Organizer::new(run_config(&dir, &inbox));
        let summary = organizer
            .run(&AtomicBool::new(true), &null_sender())
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.new_originals, 0);
        assert!(inbox.join("a.jpg").exists());
    }

    #[test]
    fn unreadable_destination_is_fatal() {
        let dir = TempDir::new().unwrap();
        let inbox = setup_sources(&dir);

        let mut config = run_config(&dir, &inbox);
        // A destination under an existing *file* cannot be created
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        config.destination = blocker.join("archive");

        let organizer = Organizer::new(config);
        let result = organizer.run(&AtomicBool::new(false), &null_sender());
        assert!(matches!(
            result,
            Err(OrganizerError::TargetInaccessible { .. })
        ));
    }

    #[test]
    fn resume_skips_checkpointed_files() {
        let dir = TempDir::new().unwrap();
        let inbox = setup_sources(&dir);
        let done = inbox.join("done.jpg");
        let fresh = inbox.join("fresh.jpg");
        fs::write(&done, b"already handled").unwrap();
        fs::write(&fresh, b"new content").unwrap();

        let mut config = run_config(&dir, &inbox);
        config.resume = true;
        fs::create_dir_all(&config.destination).unwrap();

        let mut checkpoint = checkpoint::Checkpoint::new();
        checkpoint.mark(done.clone());
        checkpoint::save(&config.destination, &checkpoint).unwrap();

        let organizer = Organizer::new(config);
        let summary = organizer
            .run(&AtomicBool::new(false), &null_sender())
            .unwrap();

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.new_originals, 1);
        assert!(done.exists(), "checkpointed file must be left alone");
        assert!(!fresh.exists(), "fresh file must be moved");
    }

    #[test]
    fn events_report_every_placement() {
        use crate::events::EventChannel;

        let dir = TempDir::new().unwrap();
        let inbox = setup_sources(&dir);
        fs::write(inbox.join("a.jpg"), b"one").unwrap();
        fs::write(inbox.join("b.jpg"), b"two").unwrap();

        let (sender, receiver) = EventChannel::new();
        let organizer = Organizer::new(run_config(&dir, &inbox));
        organizer.run(&AtomicBool::new(false), &sender).unwrap();
        drop(sender);

        let placed: Vec<_> = receiver
            .iter()
            .filter(|e| matches!(e, Event::File(FileEvent::Placed { .. })))
            .collect();
        assert_eq!(placed.len(), 2);
    }
}
