//! Paged remote asset listing and the folder tree it describes.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use playport_assets::FolderPaths;
use playport_core::{AssetId, AssetKind, FolderId, RemoteAsset};
use playport_scene::json;
use serde_json::Value;

use crate::{config::RemoteConfig, error::ListingError, fetcher::AssetFetcher, plan::sanitize_file_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
    pub parent: FolderId,
}

#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub assets: Vec<RemoteAsset>,
    pub folders: Vec<RemoteFolder>,
    /// Items on the page before filtering, used to detect the last page.
    pub item_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteListing {
    pub assets: HashMap<AssetId, RemoteAsset>,
    pub folders: Vec<RemoteFolder>,
    pub folder_paths: BTreeMap<FolderId, String>,
}

impl RemoteListing {
    pub fn record_folders(&self, store: &mut dyn FolderPaths) {
        for folder in &self.folders {
            if let Some(path) = self.folder_paths.get(&folder.id) {
                store.add_folder(folder.id, &folder.name, path);
            }
        }
    }
}

pub fn parse_listing_page(body: &[u8]) -> Result<ListingPage, ListingError> {
    let raw: Value = serde_json::from_slice(body)?;
    let Some(items) = raw.get("result").and_then(Value::as_array) else {
        return Err(ListingError::MissingResult);
    };

    let mut page = ListingPage {
        item_count: items.len(),
        ..Default::default()
    };

    for item in items {
        let id = json::asset_id(item.get("id"));
        if id == 0 {
            log::warn!("Skipping listing item without a usable id: {}", item);
            continue;
        }
        let name = json::opt_string(item.get("name")).unwrap_or_default();
        let parent = json::asset_id(item.get("parent"));
        let tag = item.get("type").and_then(Value::as_str).unwrap_or("");
        let kind = AssetKind::from_tag(tag);

        if kind == AssetKind::Folder {
            page.folders.push(RemoteFolder { id, name, parent });
            continue;
        }
        if !kind.is_importable() {
            log::debug!("Ignoring asset {} '{}' of type '{}'", id, name, tag);
            continue;
        }

        let file = item.get("file").filter(|f| f.is_object());
        page.assets.push(RemoteAsset {
            id,
            name,
            kind,
            folder: parent,
            file_name: file.and_then(|f| json::opt_string(f.get("filename"))),
            size: file.map(|f| json::asset_id(f.get("size"))).unwrap_or(0),
            hash: file
                .and_then(|f| json::opt_string(f.get("hash")))
                .unwrap_or_default(),
            url: file
                .and_then(|f| json::opt_string(f.get("url")))
                .unwrap_or_default(),
            modified_at: item
                .get("modifiedAt")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc)),
            source_id: json::opt_asset_id(item.get("sourceId")),
        });
    }

    Ok(page)
}

/// Resolves each folder to a `/`-joined path of sanitised names.
/// Unknown parents are treated as the root; parent cycles are cut.
pub fn build_folder_paths(folders: &[RemoteFolder]) -> BTreeMap<FolderId, String> {
    let by_id: HashMap<FolderId, &RemoteFolder> = folders.iter().map(|f| (f.id, f)).collect();
    let mut paths = BTreeMap::new();

    for folder in folders {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(folder);

        while let Some(node) = current {
            if !seen.insert(node.id) {
                log::warn!("Folder cycle detected at folder {} '{}'", node.id, node.name);
                break;
            }
            segments.push(sanitize_file_name(&node.name));

            current = match node.parent {
                0 => None,
                parent => {
                    let found = by_id.get(&parent).copied();
                    if found.is_none() {
                        log::warn!(
                            "Folder {} '{}' has unknown parent {}, treating it as a root",
                            node.id,
                            node.name,
                            parent
                        );
                    }
                    found
                }
            };
        }

        segments.reverse();
        paths.insert(folder.id, segments.join("/"));
    }
    paths
}

pub struct ListingClient<'a> {
    config: &'a RemoteConfig,
    fetcher: &'a dyn AssetFetcher,
}

impl<'a> ListingClient<'a> {
    pub fn new(config: &'a RemoteConfig, fetcher: &'a dyn AssetFetcher) -> Self {
        Self { config, fetcher }
    }

    /// Requests pages until a short one arrives.
    pub async fn fetch(&self) -> Result<RemoteListing, ListingError> {
        self.config.validate()?;

        let mut listing = RemoteListing::default();
        let mut skip = 0;
        loop {
            let url = self.config.listing_url(skip);
            let body = self.fetcher.fetch(&url).await?;
            let page = parse_listing_page(&body)?;
            log::debug!(
                "Listing page at skip={}: {} items, {} assets, {} folders",
                skip,
                page.item_count,
                page.assets.len(),
                page.folders.len()
            );

            listing
                .assets
                .extend(page.assets.into_iter().map(|asset| (asset.id, asset)));
            listing.folders.extend(page.folders);

            if page.item_count == 0 || page.item_count < self.config.page_size {
                break;
            }
            skip += page.item_count;
        }

        listing.folder_paths = build_folder_paths(&listing.folders);
        log::info!(
            "Remote listing: {} assets, {} folders",
            listing.assets.len(),
            listing.folders.len()
        );
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ConfigError, testing::ScriptedFetcher};

    fn folder(id: FolderId, name: &str, parent: FolderId) -> RemoteFolder {
        RemoteFolder {
            id,
            name: name.into(),
            parent,
        }
    }

    #[test]
    fn parses_assets_and_folders() {
        let page = parse_listing_page(
            br#"{"result": [
                {"id": 3, "name": "Cars", "type": "folder", "parent": null},
                {"id": "501", "name": "Car.glb", "type": "container", "parent": 3,
                 "file": {"filename": "Car.glb", "size": 2048, "hash": "abc", "url": "/api/assets/501/file/Car.glb"},
                 "modifiedAt": "2024-05-01T10:00:00.000Z", "sourceId": 77},
                {"id": 9, "name": "main.js", "type": "script"},
                {"id": 10, "name": "Paint", "type": "material", "file": null}
            ]}"#,
        )
        .unwrap();

        assert_eq!(page.item_count, 4);
        assert_eq!(page.folders, vec![folder(3, "Cars", 0)]);
        assert_eq!(page.assets.len(), 2);

        let car = &page.assets[0];
        assert_eq!(car.id, 501);
        assert_eq!(car.kind, AssetKind::Container);
        assert_eq!(car.folder, 3);
        assert_eq!(car.size, 2048);
        assert_eq!(car.source(), Some(77));
        assert!(car.modified_at.is_some());
        assert!(!page.assets[1].has_file());
    }

    #[test]
    fn missing_result_is_an_error() {
        assert!(matches!(
            parse_listing_page(br#"{"data": []}"#),
            Err(ListingError::MissingResult)
        ));
    }

    #[test]
    fn folder_paths_handle_orphans_and_cycles() {
        let paths = build_folder_paths(&[
            folder(1, "Art", 0),
            folder(2, "Cars", 1),
            folder(3, "Lost", 99),
            folder(4, "A", 5),
            folder(5, "B", 4),
        ]);

        assert_eq!(paths[&1], "Art");
        assert_eq!(paths[&2], "Art/Cars");
        assert_eq!(paths[&3], "Lost");
        assert_eq!(paths[&4], "B/A");
        assert_eq!(paths[&5], "A/B");
    }

    #[tokio::test]
    async fn fetch_follows_pages_until_short_page() {
        let config = RemoteConfig {
            project_id: "1".into(),
            branch_id: "b".into(),
            token: "t".into(),
            page_size: 2,
            ..Default::default()
        };
        let fetcher = ScriptedFetcher::new()
            .ok(
                &config.listing_url(0),
                br#"{"result": [{"id": 1, "name": "F", "type": "folder"}, {"id": 2, "name": "a.png", "type": "texture", "parent": 1}]}"#,
            )
            .ok(
                &config.listing_url(2),
                br#"{"result": [{"id": 3, "name": "b.png", "type": "texture"}]}"#,
            );

        let listing = ListingClient::new(&config, &fetcher).fetch().await.unwrap();

        assert_eq!(fetcher.requests().len(), 2);
        assert_eq!(listing.assets.len(), 2);
        assert_eq!(listing.folder_paths[&1], "F");
    }

    #[tokio::test]
    async fn fetch_refuses_without_credentials() {
        let fetcher = ScriptedFetcher::new();
        let err = ListingClient::new(&RemoteConfig::default(), &fetcher)
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::Config(ConfigError::MissingToken)));
        assert!(fetcher.requests().is_empty());
    }
}
