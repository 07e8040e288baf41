//! # Error Module
//!
//! Error types for the media organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Per-file failures are not fatal** - a bad file is skipped and counted,
//!   the run continues
//! - **Include context** - paths, file names, what went wrong
//! - **The only fatal condition** is total inability to access the target
//!   directory

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Fingerprinting error: {0}")]
    Hash(#[from] HashError),

    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("Transaction journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Undo error: {0}")]
    Undo(#[from] UndoError),

    #[error("Target directory is not accessible: {path}: {source}")]
    TargetInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while fingerprinting a file.
///
/// All of these mean "skip this file for this pass", never "abort the run".
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },
}

/// Errors that occur while placing a file into the archive.
///
/// The affected file is left untouched at its source path.
#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        source_path: PathBuf,
        dest_path: PathBuf,
        reason: String,
    },

    #[error("Source file vanished before placement: {path}")]
    SourceVanished { path: PathBuf },

    #[error("Record has no exact fingerprint: {path}")]
    MissingFingerprint { path: PathBuf },

    #[error("Move reported success but {path} does not exist")]
    NotConfirmed { path: PathBuf },

    #[error("Journal error during placement: {0}")]
    Journal(#[from] JournalError),
}

/// Errors from the transaction journal
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Failed to access transaction directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session {id}: {reason}")]
    Serialize { id: String, reason: String },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Session file is corrupted: {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

/// Errors during undo of a recorded operation.
///
/// Individual reversal failures are counted in the undo report; only a
/// session that cannot be loaded at all surfaces as an `UndoError`.
#[derive(Error, Debug)]
pub enum UndoError {
    #[error("Cannot load session {id}: {source}")]
    SessionUnavailable {
        id: String,
        #[source]
        source: JournalError,
    },

    #[error("File to restore no longer exists: {path}")]
    MissingFile { path: PathBuf },

    #[error("Delete operations cannot be reversed: {path}")]
    Irreversible { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;
