//! Project persistence: JSON save/load of the entity graph.
//!
//! The engine itself never touches the filesystem; this module is the
//! boundary the surrounding application calls. Loading always routes the
//! graph through [`TimelineStore::open`] so id migration and back-reference
//! rebuilding run before anything else sees the data.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::project::Project;
use crate::store::TimelineStore;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A project file: the entity graph plus save bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedProject {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (RFC 3339).
    pub saved_at: String,

    /// The complete entity graph.
    pub project: Project,
}

/// Quick-access facts about a save file, readable without deserializing
/// the whole graph.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveMetadata {
    pub version: u32,
    #[serde(default)]
    pub saved_at: String,
}

impl SavedProject {
    /// Wrap a project for saving, stamping the current time.
    pub fn new(project: Project) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            project,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Check a save file's version and timestamp without loading the graph.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;
        let metadata: SaveMetadata = serde_json::from_str(&content)?;

        if metadata.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: metadata.version,
            });
        }

        Ok(metadata)
    }
}

/// Load a project file and open it as a store, with all load-time repairs
/// applied.
pub async fn open_store(path: impl AsRef<Path>) -> Result<TimelineStore, PersistError> {
    let saved = SavedProject::load_json(path).await?;
    Ok(TimelineStore::open(saved.project))
}

/// Save a store's project to a file.
pub async fn save_store(store: &TimelineStore, path: impl AsRef<Path>) -> Result<(), PersistError> {
    SavedProject::new(store.project().clone()).save_json(path).await
}
