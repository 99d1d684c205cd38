use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use playport_core::AssetId;
use serde::{Deserialize, Serialize};

use crate::{error::StoreError, store};

/// What we know about a file we downloaded on a previous run.
/// Its presence does not mean the file is still on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCacheEntry {
    pub local_path: PathBuf,
    #[serde(default)]
    pub hash: String,
    pub last_modified: DateTime<Utc>,
    #[serde(alias = "size")]
    pub file_size: u64,
    pub downloaded_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: usize,
}

/// Asset ID -> cache entry, persisted as one JSON object.
/// Entries are only ever added or overwritten, never purged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCache {
    entries: BTreeMap<AssetId, AssetCacheEntry>,
}

impl AssetCache {
    /// Missing or corrupt files yield an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let cache: Self = store::load_json_or_default(path.as_ref(), "asset cache");
        log::debug!("Asset cache loaded with {} entries", cache.len());
        cache
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::save_json(path.as_ref(), self)?;
        log::info!("Asset cache saved ({} entries) to {:?}", self.len(), path.as_ref());
        Ok(())
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&AssetCacheEntry> {
        self.entries.get(&asset_id)
    }

    pub fn insert(&mut self, asset_id: AssetId, entry: AssetCacheEntry) -> Option<AssetCacheEntry> {
        self.entries.insert(asset_id, entry)
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.entries.contains_key(&asset_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
