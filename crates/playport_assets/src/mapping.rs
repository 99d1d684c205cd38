//! Key -> path stores owned outside the import core: the identity mapping
//! (logical asset ID -> produced native resource) and the folder mapping
//! (remote folder ID -> local sub-folder).

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use playport_core::{AssetId, FolderId};
use serde::{Deserialize, Serialize};

use crate::{error::StoreError, store};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeAssetType {
    Model,
    Texture,
    Material,
}

/// A produced resource. `sub_index` addresses one mesh inside a shared container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeResource {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_index: Option<usize>,
}

pub trait IdentityMap {
    /// Adds or replaces the mapping for `asset_id`.
    fn register(&mut self, asset_id: AssetId, kind: NativeAssetType, resource: NativeResource);
    fn path_by_id(&self, asset_id: AssetId) -> Option<PathBuf>;
}

pub trait FolderPaths {
    fn path_by_id(&self, folder_id: FolderId) -> Option<String>;
    fn add_folder(&mut self, folder_id: FolderId, name: &str, path: &str);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub kind: NativeAssetType,
    pub resource: NativeResource,
}

/// JSON-file backed [`IdentityMap`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetIdMapping {
    entries: BTreeMap<AssetId, IdentityEntry>,
}

impl AssetIdMapping {
    pub fn load(path: impl AsRef<Path>) -> Self {
        store::load_json_or_default(path.as_ref(), "asset id mapping")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::save_json(path.as_ref(), self)
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&IdentityEntry> {
        self.entries.get(&asset_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdentityMap for AssetIdMapping {
    fn register(&mut self, asset_id: AssetId, kind: NativeAssetType, resource: NativeResource) {
        log::debug!("Registering asset {} as {:?} -> {:?}", asset_id, kind, resource.path);
        self.entries.insert(asset_id, IdentityEntry { kind, resource });
    }

    fn path_by_id(&self, asset_id: AssetId) -> Option<PathBuf> {
        self.entries
            .get(&asset_id)
            .map(|e| e.resource.path.clone())
            .filter(|p| !p.as_os_str().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
}

/// JSON-file backed [`FolderPaths`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderMapping {
    folders: BTreeMap<FolderId, FolderEntry>,
}

impl FolderMapping {
    pub fn load(path: impl AsRef<Path>) -> Self {
        store::load_json_or_default(path.as_ref(), "folder mapping")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::save_json(path.as_ref(), self)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

impl FolderPaths for FolderMapping {
    fn path_by_id(&self, folder_id: FolderId) -> Option<String> {
        self.folders.get(&folder_id).map(|f| f.path.clone())
    }

    fn add_folder(&mut self, folder_id: FolderId, name: &str, path: &str) {
        self.folders.insert(
            folder_id,
            FolderEntry {
                name: name.to_string(),
                path: path.to_string(),
            },
        );
    }
}
