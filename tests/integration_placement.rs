//! Integration tests for the full organize pipeline.
//!
//! These tests drive real files through enumerate → hash → place and
//! verify the archive layout, duplicate filing, and journal contents.

use media_organizer::core::journal::{self, OperationKind};
use media_organizer::core::{DuplicatePolicy, Organizer, OrganizeRunConfig};
use media_organizer::events::null_sender;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;
use walkdir::WalkDir;

fn run(config: OrganizeRunConfig) -> media_organizer::events::RunSummary {
    Organizer::new(config)
        .run(&AtomicBool::new(false), &null_sender())
        .unwrap()
}

fn archive_files(archive: &Path) -> Vec<PathBuf> {
    WalkDir::new(archive)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|e| e != "json" && e != "tmp").unwrap_or(true))
        .collect()
}

#[test]
fn byte_identical_files_end_up_as_original_plus_duplicate() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("vacation.jpg"), b"identical pixel data").unwrap();
    fs::write(inbox.join("vacation - Copy.jpg"), b"identical pixel data").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox.clone()], archive.clone()));

    // Depending on worker order the loser is either filed directly or
    // demoted by the winner; exactly one file ends up under Duplicates
    assert_eq!(summary.new_originals, 1);
    assert_eq!(summary.duplicates + summary.replaced_originals, 1);
    assert_eq!(summary.failed, 0);

    let placed = archive_files(&archive);
    assert_eq!(placed.len(), 2);

    // One lives under Photos/..., the other under a Duplicates sibling
    let originals: Vec<_> = placed
        .iter()
        .filter(|p| !p.parent().unwrap().ends_with("Duplicates"))
        .collect();
    let duplicates: Vec<_> = placed
        .iter()
        .filter(|p| p.parent().unwrap().ends_with("Duplicates"))
        .collect();
    assert_eq!(originals.len(), 1);
    assert_eq!(duplicates.len(), 1);

    // The Duplicates folder sits beside the original's destination
    assert_eq!(
        duplicates[0].parent().unwrap().parent().unwrap(),
        originals[0].parent().unwrap()
    );

    // Inbox is drained
    assert!(!inbox.join("vacation.jpg").exists());
    assert!(!inbox.join("vacation - Copy.jpg").exists());
}

#[test]
fn copy_suffixes_are_stripped_at_the_destination() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("ADLZ2152 - Copy.JPG"), b"raw scan data").unwrap();

    run(OrganizeRunConfig::new(vec![inbox], archive.clone()));

    let placed = archive_files(&archive);
    assert_eq!(placed.len(), 1);
    assert_eq!(
        placed[0].file_name().unwrap().to_string_lossy(),
        "ADLZ2152.JPG"
    );
}

#[test]
fn burst_shots_are_kept_as_independent_originals() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    // Same bytes, consecutive shutter counters: not duplicates
    fs::write(inbox.join("IMG_0146.JPG"), b"burst frame").unwrap();
    fs::write(inbox.join("IMG_0147.JPG"), b"burst frame").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive.clone()));

    assert_eq!(summary.new_originals, 2);
    assert_eq!(summary.duplicates, 0);

    let placed = archive_files(&archive);
    assert!(placed
        .iter()
        .all(|p| !p.parent().unwrap().ends_with("Duplicates")));
}

#[test]
fn raw_jpeg_siblings_are_kept_as_independent_originals() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("IMG_001.CR2"), b"sensor dump").unwrap();
    fs::write(inbox.join("IMG_001.JPG"), b"sensor dump").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive));

    assert_eq!(summary.new_originals, 2);
    assert_eq!(summary.duplicates, 0);
}

#[test]
fn keep_both_policy_never_files_duplicates() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("a.jpg"), b"same bytes").unwrap();
    fs::write(inbox.join("b.jpg"), b"same bytes").unwrap();

    let mut config = OrganizeRunConfig::new(vec![inbox], archive);
    config.policy = DuplicatePolicy::KeepBoth;
    let summary = run(config);

    assert_eq!(summary.new_originals, 2);
    assert_eq!(summary.duplicates, 0);
}

#[test]
fn non_media_files_are_left_in_place() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("notes.txt"), b"shopping list").unwrap();
    fs::write(inbox.join("photo.jpg"), b"pixels").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox.clone()], archive));

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.new_originals, 1);
    assert!(inbox.join("notes.txt").exists());
    assert!(!inbox.join("photo.jpg").exists());
}

#[test]
fn every_move_is_journaled_in_the_session() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    fs::write(inbox.join("a.jpg"), b"one").unwrap();
    fs::write(inbox.join("b.jpg"), b"two").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive.clone()));

    let session = journal::load_session(&summary.session_id, &archive).unwrap();
    let moves: Vec<_> = session
        .operations
        .iter()
        .filter(|op| op.kind == OperationKind::Move)
        .collect();
    assert_eq!(moves.len(), 2);
    assert!(moves.iter().all(|op| op.completed));

    // Directory creation was journaled too
    assert!(session
        .operations
        .iter()
        .any(|op| op.kind == OperationKind::CreateFolder));
}

#[test]
fn empty_source_directory_is_a_clean_noop() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive));

    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.new_originals, 0);
    assert_eq!(summary.failed, 0);
}

#[test]
fn corrupt_image_still_gets_filed_by_exact_hash() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(&inbox).unwrap();

    // Not decodable as an image: no perceptual signal, but the exact
    // fingerprint still works and the file is still organized
    fs::write(inbox.join("broken.jpg"), b"not really a jpeg").unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive.clone()));

    assert_eq!(summary.new_originals, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(archive_files(&archive).len(), 1);
}

#[test]
fn identical_content_in_nested_folders_collides() {
    let temp = TempDir::new().unwrap();
    let inbox = temp.path().join("inbox");
    let archive = temp.path().join("archive");
    fs::create_dir_all(inbox.join("2019/phone")).unwrap();
    fs::create_dir_all(inbox.join("backup of backup")).unwrap();

    fs::write(inbox.join("2019/phone/pic.jpg"), b"the one true photo").unwrap();
    fs::write(
        inbox.join("backup of backup/pic.jpg"),
        b"the one true photo",
    )
    .unwrap();

    let summary = run(OrganizeRunConfig::new(vec![inbox], archive));

    assert_eq!(summary.new_originals, 1);
    assert_eq!(summary.duplicates + summary.replaced_originals, 1);
}
