//! Types for the placement engine.

use crate::core::arbiter::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Folder structure options for the archive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FolderStructure {
    /// Year/Month (e.g., 2024/01 - January/)
    #[default]
    YearMonth,
    /// Year/Month/Day (e.g., 2024/01/15/)
    YearMonthDay,
    /// Flat Year-Month (e.g., 2024-01/)
    YearMonthFlat,
}

/// Configuration for one placement run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Archive root everything is placed under
    pub destination: PathBuf,
    pub structure: FolderStructure,
    pub policy: DuplicatePolicy,
}

impl PlacementConfig {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            structure: FolderStructure::default(),
            policy: DuplicatePolicy::default(),
        }
    }
}

/// What the placement engine decided for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementDecision {
    /// First sighting of this fingerprint; the file became the original
    NewOriginal,
    /// The file beat an indexed original and took over its place
    ReplacedOriginal,
    /// The file lost arbitration and was filed under Duplicates
    FiledAsDuplicate,
}

/// Result of placing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub decision: PlacementDecision,
    pub path_before: PathBuf,
    pub path_after: PathBuf,
}
