use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::ephemeris::EphemerisSnapshot;

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// A parsed feed together with the time it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub stored_at: DateTime<Utc>,
    pub snapshot: Arc<EphemerisSnapshot>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),
}

/// Store of cached snapshots. Entries are never modified once written.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent entry stored strictly after `since`.
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<CachedSnapshot>, StoreError>;

    async fn insert(&self, entry: &CachedSnapshot) -> Result<(), StoreError>;
}

/// One JSON document per snapshot in a folder.
///
/// File names start with the storage timestamp so the newest entry can be
/// picked without reading every document.
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        FileStore { base }
    }

    fn generate_name(&self, stored_at: DateTime<Utc>) -> String {
        let uuid = uuid::Uuid::new_v4();
        let timestamp = stored_at.format(FILE_TIMESTAMP_FORMAT);
        format!("{}_{}.json", timestamp, uuid)
    }

    fn timestamp_of(name: &str) -> Option<DateTime<Utc>> {
        let stem = name.strip_suffix(".json")?;
        let (timestamp, _) = stem.split_once('_')?;
        NaiveDateTime::parse_from_str(timestamp, FILE_TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.and_utc())
    }

    /// Snapshot files stored strictly after `since`, newest first.
    async fn files_since(&self, since: DateTime<Utc>) -> Result<Vec<(DateTime<Utc>, PathBuf)>, StoreError> {
        if !tokio::fs::try_exists(&self.base).await? {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(timestamp) = name.to_str().and_then(Self::timestamp_of) else {
                continue;
            };
            if timestamp > since {
                files.push((timestamp, entry.path()));
            }
        }
        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files)
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<CachedSnapshot>, StoreError> {
        for (_, path) in self.files_since(since).await? {
            let content = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<CachedSnapshot>(&content) {
                Ok(entry) => return Ok(Some(entry)),
                Err(e) => log::warn!("Skipping corrupt snapshot {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    async fn insert(&self, entry: &CachedSnapshot) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base).await?;

        let content = serde_json::to_vec(entry).map_err(StoreError::Serialize)?;
        let name = self.generate_name(entry.stored_at);
        let partial = self.base.join(format!(".{}.partial", name));
        tokio::fs::write(&partial, content).await?;
        tokio::fs::rename(&partial, self.base.join(&name)).await?;

        log::debug!("Stored snapshot {}", name);
        Ok(())
    }
}

/// In-process store keeping only the newest snapshot; contents are lost on
/// restart.
#[derive(Default)]
pub struct MemoryStore {
    latest: RwLock<Option<CachedSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<CachedSnapshot>, StoreError> {
        let latest = self.latest.read().unwrap_or_else(|e| e.into_inner());
        Ok(latest.as_ref().filter(|e| e.stored_at > since).cloned())
    }

    async fn insert(&self, entry: &CachedSnapshot) -> Result<(), StoreError> {
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        if latest.as_ref().map_or(true, |e| e.stored_at <= entry.stored_at) {
            *latest = Some(entry.clone());
        }
        Ok(())
    }
}
