//! Turns collected dependencies into an ordered list of download tasks.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use playport_assets::{AssetCache, AssetStatus, CollectedDependencies, FolderPaths, IdentityMap, StatusResolver};
use playport_core::{AssetId, AssetKind, RemoteAsset};
use playport_scene::SceneDocument;

use crate::{config::RemoteConfig, fetcher::alternate_source_url, priority::priority};

#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub asset_id: AssetId,
    pub asset: RemoteAsset,
    pub url: String,
    /// Tried once if `url` answers 403.
    pub alternate_url: Option<String>,
    pub target: PathBuf,
    pub priority: f64,
    pub usage_count: usize,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadPlan {
    /// Highest priority first.
    pub tasks: Vec<DownloadTask>,
    /// Binary ID -> local file, for every binary already up to date or scheduled.
    pub files: HashMap<AssetId, PathBuf>,
    /// Referencing asset (model, render, container, texture, material) -> binary ID.
    pub binaries: HashMap<AssetId, AssetId>,
    pub up_to_date: Vec<AssetId>,
    /// Referenced assets nothing could be resolved for.
    pub missing: Vec<AssetId>,
}

impl DownloadPlan {
    /// Local file holding the data of a referenced asset.
    pub fn file_for(&self, asset_id: AssetId) -> Option<&Path> {
        self.binaries
            .get(&asset_id)
            .and_then(|binary| self.files.get(binary))
            .map(PathBuf::as_path)
    }
}

const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a remote name safe as a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() || trimmed == ".." {
        "asset".to_string()
    } else {
        trimmed.to_string()
    }
}

fn file_extension(name: Option<&str>) -> Option<String> {
    name.and_then(|n| Path::new(n).extension())
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
}

/// `<root>/<folder path>/<stem>_<id><ext>`. The ID suffix keeps paths unique
/// across distinct assets.
pub fn target_path(asset_root: &Path, asset: &RemoteAsset, folders: &dyn FolderPaths) -> PathBuf {
    let mut path = asset_root.to_path_buf();
    if asset.folder != 0 {
        match folders.path_by_id(asset.folder) {
            Some(folder) if !folder.is_empty() => path.extend(folder.split('/').filter(|s| !s.is_empty())),
            _ => path.push(format!("_UnmappedFolder_{}", asset.folder)),
        }
    }

    let file_name = asset.file_name.as_deref().or(Some(asset.name.as_str()));
    let extension = match asset.kind {
        AssetKind::Material => Some(".json".to_string()),
        AssetKind::Model => file_extension(file_name).or_else(|| Some(".glb".to_string())),
        AssetKind::Texture => file_extension(file_name).or_else(|| Some(".png".to_string())),
        _ => file_extension(file_name),
    }
    .unwrap_or_default();

    let stem = Path::new(&asset.name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.push(format!("{}_{}{}", sanitize_file_name(&stem), asset.id, extension));
    path
}

// A binary to fetch, before status and ordering are applied.
struct Candidate {
    asset: RemoteAsset,
    usage_count: usize,
    backs_container: bool,
    discovery: usize,
}

pub struct DownloadPlanner<'a> {
    config: &'a RemoteConfig,
    asset_root: &'a Path,
    cache: &'a AssetCache,
    identity: &'a dyn IdentityMap,
    folders: &'a dyn FolderPaths,
}

impl<'a> DownloadPlanner<'a> {
    pub fn new(
        config: &'a RemoteConfig,
        asset_root: &'a Path,
        cache: &'a AssetCache,
        identity: &'a dyn IdentityMap,
        folders: &'a dyn FolderPaths,
    ) -> Self {
        Self {
            config,
            asset_root,
            cache,
            identity,
            folders,
        }
    }

    pub fn plan(
        &self,
        deps: &CollectedDependencies,
        remote: &HashMap<AssetId, RemoteAsset>,
        scene: &SceneDocument,
    ) -> DownloadPlan {
        let mut plan = DownloadPlan::default();
        let mut candidates: BTreeMap<AssetId, Candidate> = BTreeMap::new();

        let mut add = |plan: &mut DownloadPlan, referrer: AssetId, asset: RemoteAsset, usage: usize, backs: bool, discovery: usize| {
            plan.binaries.insert(referrer, asset.id);
            let entry = candidates.entry(asset.id).or_insert(Candidate {
                asset,
                usage_count: 0,
                backs_container: false,
                discovery,
            });
            entry.usage_count += usage;
            entry.backs_container |= backs;
            entry.discovery = entry.discovery.min(discovery);
        };

        for usage in deps.models.values() {
            match direct_binary(usage.asset_id, remote) {
                Some(binary) => add(&mut plan, usage.asset_id, binary, usage.usage_count(), false, usage.discovery),
                None => self.missing(&mut plan, usage.asset_id, usage.asset_id, "model"),
            }
        }

        // Group container-backed renders by container.
        let mut containers: BTreeMap<AssetId, (usize, usize)> = BTreeMap::new();
        for usage in deps.render_assets.values() {
            match deps.render_to_container.get(&usage.asset_id) {
                Some(&container_id) => {
                    let slot = containers.entry(container_id).or_insert((0, usage.discovery));
                    slot.0 += 1;
                    slot.1 = slot.1.min(usage.discovery);
                }
                None => match direct_binary(usage.asset_id, remote) {
                    Some(binary) => add(&mut plan, usage.asset_id, binary, usage.usage_count(), false, usage.discovery),
                    None => self.missing(&mut plan, usage.asset_id, usage.asset_id, "render"),
                },
            }
        }

        for (&container_id, &(referenced, discovery)) in &containers {
            let descriptor = scene.containers.get(&container_id);
            let binary = descriptor
                .and_then(|c| c.source_id)
                .or_else(|| remote.get(&container_id).and_then(RemoteAsset::source))
                .and_then(|source| remote.get(&source))
                .or_else(|| remote.get(&container_id).filter(|c| c.has_file()))
                .cloned();

            let binary_id = binary
                .as_ref()
                .map(|b| b.id)
                .or_else(|| descriptor.and_then(|c| c.source_id))
                .unwrap_or(container_id);
            for render in deps.render_assets.values() {
                if deps.render_to_container.get(&render.asset_id) == Some(&container_id) {
                    plan.binaries.insert(render.asset_id, binary_id);
                }
            }

            match binary {
                Some(binary) => {
                    let usage = descriptor.map(|c| c.renders.len()).unwrap_or(0).max(referenced);
                    add(&mut plan, container_id, binary, usage, true, discovery);
                }
                None => self.missing(&mut plan, container_id, binary_id, "container"),
            }
        }

        for usage in deps.materials.values() {
            // Materials are usually described by the scene document alone.
            if let Some(asset) = remote.get(&usage.asset_id).filter(|a| a.has_file()) {
                add(&mut plan, usage.asset_id, asset.clone(), usage.usage_count(), false, usage.discovery);
            }
        }

        for usage in deps.textures.values() {
            let asset = remote.get(&usage.asset_id).cloned().or_else(|| {
                scene
                    .textures
                    .get(&usage.asset_id)
                    .map(|t| t.to_remote_asset())
                    .filter(RemoteAsset::has_file)
            });
            match asset {
                Some(asset) => add(&mut plan, usage.asset_id, asset, usage.usage_count(), false, usage.discovery),
                None => self.missing(&mut plan, usage.asset_id, usage.asset_id, "texture"),
            }
        }

        let resolver = StatusResolver::new(self.cache, self.identity);
        let mut ordered: Vec<Candidate> = candidates.into_values().collect();
        ordered.sort_by_key(|c| c.discovery);

        for candidate in ordered {
            let asset = candidate.asset;
            let status = resolver.classify(asset.id, &asset);

            if !status.needs_download() {
                if let Some(entry) = self.cache.get(asset.id) {
                    plan.files.insert(asset.id, entry.local_path.clone());
                }
                plan.up_to_date.push(asset.id);
                continue;
            }

            if !asset.has_file() {
                // Known only from the cache (offline run or vanished from the listing).
                match self.cache.get(asset.id).filter(|e| e.local_path.is_file()) {
                    Some(entry) => {
                        log::warn!("Asset {} '{}' has no download URL, using cached file", asset.id, asset.name);
                        plan.files.insert(asset.id, entry.local_path.clone());
                    }
                    None => self.missing(&mut plan, asset.id, asset.id, asset.kind.as_str()),
                }
                continue;
            }

            let url = self.config.resolve_url(&asset.url);
            let alternate_url = asset.source().and_then(|source| alternate_source_url(&url, source));
            let target = target_path(self.asset_root, &asset, self.folders);
            log::debug!("Asset {} '{}' is {:?}, scheduling download to {:?}", asset.id, asset.name, status, target);

            plan.files.insert(asset.id, target.clone());
            plan.tasks.push(DownloadTask {
                asset_id: asset.id,
                priority: priority(candidate.usage_count, asset.kind, asset.size, candidate.backs_container),
                usage_count: candidate.usage_count,
                url,
                alternate_url,
                target,
                status,
                asset,
            });
        }

        // Stable: equal priorities keep discovery order.
        plan.tasks.sort_by(|a, b| b.priority.total_cmp(&a.priority));

        log::info!(
            "Download plan: {} tasks, {} up to date, {} unresolved",
            plan.tasks.len(),
            plan.up_to_date.len(),
            plan.missing.len()
        );
        plan
    }

    fn missing(&self, plan: &mut DownloadPlan, referrer: AssetId, binary_id: AssetId, what: &str) {
        // Offline runs have no listing: fall back on whatever the cache recorded.
        if let Some(entry) = self.cache.get(binary_id).filter(|e| e.local_path.is_file()) {
            log::debug!("No remote {} {}, using cached {:?}", what, referrer, entry.local_path);
            plan.binaries.insert(referrer, binary_id);
            plan.files.insert(binary_id, entry.local_path.clone());
            return;
        }
        log::warn!("No downloadable {} found for asset {}", what, referrer);
        plan.missing.push(referrer);
    }
}

/// The asset's own file, else the binary its `sourceId` names.
fn direct_binary(asset_id: AssetId, remote: &HashMap<AssetId, RemoteAsset>) -> Option<RemoteAsset> {
    let asset = remote.get(&asset_id)?;
    if asset.has_file() {
        return Some(asset.clone());
    }
    asset
        .source()
        .and_then(|source| remote.get(&source))
        .filter(|source| source.has_file())
        .cloned()
}
