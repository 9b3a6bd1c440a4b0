use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::moderation::{ModerationData, StateError, StateStore};

/// Moderation state kept in a single pretty-printed JSON file.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<ModerationData, StateError> {
        if !self.path.exists() {
            tracing::info!("No state file at {}, starting empty", self.path.display());
            return Ok(ModerationData::default());
        }

        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StateError::StorageError(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| StateError::StorageError(e.to_string()))
    }

    async fn save(&self, data: &ModerationData) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StateError::StorageError(e.to_string()))?;
        }

        let text =
            serde_json::to_string_pretty(data).map_err(|e| StateError::StorageError(e.to_string()))?;
        fs::write(&self.path, text)
            .await
            .map_err(|e| StateError::StorageError(e.to_string()))
    }
}
