use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::UpdateId, ports::OffsetStore, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OffsetFileData {
    confirmed_offset: UpdateId,
    saved_at: String,
}

/// Persists the confirmed offset as a small JSON file.
#[derive(Clone, Debug)]
pub struct FileOffsetStore {
    path: PathBuf,
}

impl FileOffsetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OffsetStore for FileOffsetStore {
    async fn load(&self) -> Result<Option<UpdateId>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let txt = tokio::fs::read_to_string(&self.path).await?;
        if txt.trim().is_empty() {
            return Ok(None);
        }
        let data: OffsetFileData = serde_json::from_str(&txt)?;
        Ok(Some(data.confirmed_offset))
    }

    async fn save(&self, offset: UpdateId) -> Result<()> {
        let data = OffsetFileData {
            confirmed_offset: offset,
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        let txt = serde_json::to_string(&data)?;

        // Readers only ever see a complete file.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, txt).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the offset for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryOffsetStore {
    offset: Mutex<Option<UpdateId>>,
}

#[async_trait]
impl OffsetStore for MemoryOffsetStore {
    async fn load(&self) -> Result<Option<UpdateId>> {
        Ok(*self.offset.lock().await)
    }

    async fn save(&self, offset: UpdateId) -> Result<()> {
        *self.offset.lock().await = Some(offset);
        Ok(())
    }
}
