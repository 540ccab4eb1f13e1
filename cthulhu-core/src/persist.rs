//! Story persistence for save/load functionality.
//!
//! Serializes the full story state (scenes plus counter rows) to a
//! versioned JSON file, with a cheap metadata peek for listings.

use crate::scene::Scene;
use crate::store::CounterRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved story with everything needed to resume generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStory {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: DateTime<Utc>,

    /// All finalized scenes, in order.
    pub scenes: Vec<Scene>,

    /// The durable counter rows.
    pub counters: Vec<CounterRow>,

    /// Quick-access metadata.
    pub metadata: StoryMetadata,
}

/// Metadata about a save file, readable without loading the scenes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMetadata {
    pub scene_count: usize,
    pub story_ended: bool,
    pub winner: Option<String>,
    pub latest_scene_timestamp: Option<DateTime<Utc>>,
}

impl SavedStory {
    /// Assemble a save from the current state.
    pub fn new(scenes: Vec<Scene>, counters: Vec<CounterRow>, saved_at: DateTime<Utc>) -> Self {
        let last = scenes.last();
        let metadata = StoryMetadata {
            scene_count: scenes.len(),
            story_ended: last.map(|s| s.scene_ends_story).unwrap_or(false),
            winner: last
                .and_then(|s| s.story_winner)
                .map(|f| f.key().to_string()),
            latest_scene_timestamp: last.map(|s| s.scene_timestamp),
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            scenes,
            counters,
            metadata,
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

    /// Read just the metadata without deserializing the scene list.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<StoryMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: StoryMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}
