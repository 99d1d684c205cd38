use playport_core::{AssetId, RemoteAsset};

use crate::{cache::AssetCache, mapping::IdentityMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    NotDownloaded,
    UpToDate,
    Outdated,
    Corrupted,
}

impl AssetStatus {
    pub fn needs_download(&self) -> bool {
        *self != AssetStatus::UpToDate
    }
}

/// Decides whether a referenced asset must be fetched again.
pub struct StatusResolver<'a> {
    cache: &'a AssetCache,
    identity: &'a dyn IdentityMap,
}

impl<'a> StatusResolver<'a> {
    pub fn new(cache: &'a AssetCache, identity: &'a dyn IdentityMap) -> Self {
        Self { cache, identity }
    }

    /// Checks run strongest signal first and the first decisive one wins.
    pub fn classify(&self, asset_id: AssetId, remote: &RemoteAsset) -> AssetStatus {
        let Some(cached) = self.cache.get(asset_id) else {
            log::debug!("Asset {} not in cache - NotDownloaded", asset_id);
            return AssetStatus::NotDownloaded;
        };

        if !cached.local_path.is_file() {
            log::debug!("Asset {} missing on disk at {:?} - Corrupted", asset_id, cached.local_path);
            return AssetStatus::Corrupted;
        }

        // Hash comparison is authoritative when both sides have one.
        if !remote.hash.is_empty() && !cached.hash.is_empty() {
            return if remote.hash == cached.hash {
                AssetStatus::UpToDate
            } else {
                log::debug!("Asset {} hash changed - Outdated", asset_id);
                AssetStatus::Outdated
            };
        }

        if self
            .identity
            .path_by_id(asset_id)
            .is_some_and(|path| path.is_file())
        {
            return AssetStatus::UpToDate;
        }

        if remote
            .modified_at
            .is_some_and(|modified| modified > cached.last_modified)
        {
            log::debug!("Asset {} modified remotely - Outdated", asset_id);
            return AssetStatus::Outdated;
        }

        let on_disk = std::fs::metadata(&cached.local_path).map(|m| m.len());
        if on_disk.ok() != Some(cached.file_size) {
            log::debug!("Asset {} size differs from cache - Corrupted", asset_id);
            return AssetStatus::Corrupted;
        }

        AssetStatus::UpToDate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::AssetCacheEntry,
        mapping::{AssetIdMapping, NativeAssetType, NativeResource},
    };
    use chrono::{Duration, Utc};
    use std::path::Path;

    struct Fixture {
        dir: tempfile::TempDir,
        cache: AssetCache,
        identity: AssetIdMapping,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                cache: AssetCache::default(),
                identity: AssetIdMapping::default(),
            }
        }

        fn file(&self, name: &str, bytes: &[u8]) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, bytes).unwrap();
            path
        }

        fn cache_entry(&mut self, id: AssetId, path: &Path, hash: &str, size: u64) {
            let now = Utc::now();
            self.cache.insert(
                id,
                AssetCacheEntry {
                    local_path: path.to_path_buf(),
                    hash: hash.into(),
                    last_modified: now - Duration::hours(1),
                    file_size: size,
                    downloaded_at: now,
                    usage_count: 1,
                },
            );
        }

        fn classify(&self, id: AssetId, remote: &RemoteAsset) -> AssetStatus {
            StatusResolver::new(&self.cache, &self.identity).classify(id, remote)
        }
    }

    fn remote(id: AssetId, hash: &str, size: u64) -> RemoteAsset {
        RemoteAsset {
            id,
            hash: hash.into(),
            size,
            ..Default::default()
        }
    }

    #[test]
    fn no_entry_is_not_downloaded_even_with_remote_hash() {
        let fx = Fixture::new();
        assert_eq!(fx.classify(1, &remote(1, "abc", 10)), AssetStatus::NotDownloaded);
    }

    #[test]
    fn missing_file_is_corrupted() {
        let mut fx = Fixture::new();
        let path = fx.dir.path().join("gone.png");
        fx.cache_entry(1, &path, "abc", 3);
        assert_eq!(fx.classify(1, &remote(1, "abc", 3)), AssetStatus::Corrupted);
    }

    #[test]
    fn equal_hash_wins_over_every_other_signal() {
        let mut fx = Fixture::new();
        let path = fx.file("a.png", b"12345");
        // Recorded size is wrong and the remote claims a newer mtime.
        fx.cache_entry(1, &path, "abc", 999);
        let mut r = remote(1, "abc", 1);
        r.modified_at = Some(Utc::now() + Duration::days(3));

        assert_eq!(fx.classify(1, &r), AssetStatus::UpToDate);
    }

    #[test]
    fn different_hash_is_outdated() {
        let mut fx = Fixture::new();
        let path = fx.file("a.png", b"12345");
        fx.cache_entry(1, &path, "abc", 5);
        assert_eq!(fx.classify(1, &remote(1, "def", 5)), AssetStatus::Outdated);
    }

    #[test]
    fn identity_mapping_short_circuits_without_hash() {
        let mut fx = Fixture::new();
        let path = fx.file("a.glb", b"12345");
        fx.cache_entry(1, &path, "", 999);
        fx.identity.register(
            1,
            NativeAssetType::Model,
            NativeResource {
                path: path.clone(),
                sub_index: None,
            },
        );
        assert_eq!(fx.classify(1, &remote(1, "", 5)), AssetStatus::UpToDate);
    }

    #[test]
    fn newer_remote_mtime_is_outdated() {
        let mut fx = Fixture::new();
        let path = fx.file("a.png", b"12345");
        fx.cache_entry(1, &path, "", 5);
        let mut r = remote(1, "", 5);
        r.modified_at = Some(Utc::now());
        assert_eq!(fx.classify(1, &r), AssetStatus::Outdated);
    }

    #[test]
    fn size_mismatch_is_corrupted() {
        let mut fx = Fixture::new();
        let path = fx.file("a.png", b"12345");
        fx.cache_entry(1, &path, "", 4);
        assert_eq!(fx.classify(1, &remote(1, "", 5)), AssetStatus::Corrupted);
    }

    #[test]
    fn exhausted_signals_default_to_up_to_date() {
        let mut fx = Fixture::new();
        let path = fx.file("a.png", b"12345");
        fx.cache_entry(1, &path, "abc", 5);
        let mut r = remote(1, "", 5);
        r.modified_at = Some(Utc::now() - Duration::days(1));
        assert_eq!(fx.classify(1, &r), AssetStatus::UpToDate);
    }
}
