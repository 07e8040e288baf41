//! # Media Organizer
//!
//! Organizes messy photo/video collections into a canonical dated layout
//! while detecting duplicates - byte-identical and visually identical -
//! without ever silently destroying the better copy of a file.
//!
//! ## Core Philosophy
//! - **Never lose data** - every move is journaled and undoable
//! - **Deterministic arbitration** - collisions always resolve the same way
//! - **Per-file failure isolation** - one bad file never aborts a run
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation
//! layers:
//! - `core` - fingerprinting, arbitration, placement, journal/undo
//! - `events` - event-driven progress reporting (GUI-ready)
//! - `error` - error taxonomy
//! - `cli` - command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
