//! End-to-end import: scene -> dependencies -> listing -> downloads -> extraction.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
};

use playport_assets::{
    AssetCache, AssetIdMapping, CACHE_FILE, CollectedDependencies, ContainerExtractor,
    FOLDER_MAPPING_FILE, FolderMapping, ID_MAPPING_FILE, ProcessedAsset, ProcessedAssets,
    collect, resolve_render_index,
};
use playport_core::{AssetId, CancelFlag, RemoteAsset};
use playport_remote::{
    ConfigError, DownloadEvent, DownloadExecutor, DownloadPlanner, DownloadReport, AssetFetcher,
    ListingClient, ListingError, RemoteConfig,
};
use playport_scene::{Entity, RenderComponent, SceneDocument, SceneError, SceneStatistics};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to load scene: {0}")]
    Scene(#[from] SceneError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to start I/O runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub scene_path: PathBuf,
    pub asset_root: PathBuf,
    pub remote: RemoteConfig,
    pub offline: bool,
}

/// Best-effort result: assets that failed are absent from `processed`.
#[derive(Debug)]
pub struct ImportOutcome {
    pub scene: SceneDocument,
    pub statistics: SceneStatistics,
    pub dependencies: CollectedDependencies,
    pub processed: ProcessedAssets,
    pub failures: Vec<(AssetId, String)>,
    pub report: Option<DownloadReport>,
}

/// Consumer of the resolved assets in the destination engine.
pub trait SceneAssembler {
    fn assemble(&mut self, scene: &SceneDocument, assets: &ProcessedAssets);
}

/// Counts what an engine-side assembler would place, and what would need a placeholder.
#[derive(Debug, Default)]
pub struct SummaryAssembler {
    pub placed: usize,
    pub placeholders: Vec<(String, AssetId)>,
}

impl SummaryAssembler {
    fn visit(&mut self, entity: &Entity, path: &str, assets: &ProcessedAssets) {
        let mut referenced = Vec::new();
        if let Some(model) = entity.model().filter(|m| m.asset != 0) {
            referenced.push(model.asset);
        }
        if let Some(RenderComponent::Asset { asset, .. }) = entity.render() {
            if *asset != 0 {
                referenced.push(*asset);
            }
        }

        for asset_id in referenced {
            if assets.contains_key(&asset_id) {
                self.placed += 1;
            } else {
                log::warn!("Entity '{}' needs a placeholder for missing asset {}", path, asset_id);
                self.placeholders.push((path.to_string(), asset_id));
            }
        }
    }
}

impl SceneAssembler for SummaryAssembler {
    fn assemble(&mut self, scene: &SceneDocument, assets: &ProcessedAssets) {
        scene.root.walk(&mut |entity, path| self.visit(entity, path, assets));
        log::info!(
            "Assembled scene: {} meshes placed, {} placeholders",
            self.placed,
            self.placeholders.len()
        );
    }
}

pub struct ImportPipeline {
    settings: ImportSettings,
    fetcher: Arc<dyn AssetFetcher>,
    cancel: CancelFlag,
    events: Option<UnboundedSender<DownloadEvent>>,
}

impl ImportPipeline {
    pub fn new(settings: ImportSettings, fetcher: Arc<dyn AssetFetcher>, cancel: CancelFlag) -> Self {
        Self {
            settings,
            fetcher,
            cancel,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: UnboundedSender<DownloadEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub async fn run(&self) -> Result<ImportOutcome, ImportError> {
        let settings = &self.settings;
        if !settings.offline {
            // Fatal before anything touches the network.
            settings.remote.validate()?;
        }

        let scene = SceneDocument::load(&settings.scene_path)?;
        let statistics = SceneStatistics::collect(&scene.root);
        log::info!(
            "Scene statistics: {} nodes, {} with meshes, {} lights ({} point, {} spot, {} directional, {} area)",
            statistics.total_nodes,
            statistics.mesh_nodes,
            statistics.total_lights,
            statistics.point_lights,
            statistics.spot_lights,
            statistics.directional_lights,
            statistics.area_lights()
        );

        let dependencies = collect(&scene.root, &scene.materials);

        let root = &settings.asset_root;
        let cache_path = root.join(CACHE_FILE);
        let cache = AssetCache::load(&cache_path);
        let mut identity = AssetIdMapping::load(root.join(ID_MAPPING_FILE));
        let mut folders = FolderMapping::load(root.join(FOLDER_MAPPING_FILE));

        let remote = self.fetch_listing(&mut folders).await?;

        let plan = DownloadPlanner::new(&settings.remote, root, &cache, &identity, &folders)
            .plan(&dependencies, &remote, &scene);

        let report = if settings.offline || plan.tasks.is_empty() {
            None
        } else {
            let mut executor = DownloadExecutor::new(
                self.fetcher.clone(),
                settings.remote.max_concurrent,
                self.cancel.clone(),
            );
            if let Some(sender) = &self.events {
                executor = executor.with_events(sender.clone());
            }
            let shared = Arc::new(Mutex::new(cache));
            Some(executor.run(plan.tasks.clone(), shared, &cache_path).await)
        };

        let names = asset_names(&remote, &scene);
        let mut processed = ProcessedAssets::new();
        let mut failures = Vec::new();
        {
            let mut extractor = ContainerExtractor::new(&names, &mut identity);
            let mut record = |asset_id: AssetId, result: Result<ProcessedAsset, String>| match result {
                Ok(asset) => {
                    processed.insert(asset_id, asset);
                }
                Err(message) => {
                    log::error!("Asset {} could not be processed: {}", asset_id, message);
                    failures.push((asset_id, message));
                }
            };

            for usage in dependencies.render_assets.values() {
                let render_id = usage.asset_id;
                let Some(file) = plan.file_for(render_id).filter(|f| f.is_file()) else {
                    record(render_id, Err("no local file".to_string()));
                    continue;
                };

                let result = match dependencies.render_to_container.get(&render_id) {
                    Some(container_id) => {
                        let index = resolve_render_index(
                            render_id,
                            scene.containers.get(container_id),
                            usage.render_index,
                        );
                        extractor.extract(file, index as usize, render_id)
                    }
                    None => extractor.process_model(file, render_id),
                };
                record(render_id, result.map_err(|e| e.to_string()));
            }

            for usage in dependencies.models.values() {
                let model_id = usage.asset_id;
                let Some(file) = plan.file_for(model_id).filter(|f| f.is_file()) else {
                    record(model_id, Err("no local file".to_string()));
                    continue;
                };
                let result = extractor.process_model(file, model_id);
                record(model_id, result.map_err(|e| e.to_string()));
            }
        }

        if let Err(e) = identity.save(root.join(ID_MAPPING_FILE)) {
            log::error!("Failed to save asset id mapping: {}", e);
        }
        if let Err(e) = folders.save(root.join(FOLDER_MAPPING_FILE)) {
            log::error!("Failed to save folder mapping: {}", e);
        }

        log::info!(
            "Import finished: {} assets processed, {} failed",
            processed.len(),
            failures.len()
        );
        Ok(ImportOutcome {
            scene,
            statistics,
            dependencies,
            processed,
            failures,
            report,
        })
    }

    async fn fetch_listing(
        &self,
        folders: &mut FolderMapping,
    ) -> Result<HashMap<AssetId, RemoteAsset>, ImportError> {
        if self.settings.offline {
            log::info!("Offline mode: skipping remote listing and downloads");
            return Ok(HashMap::new());
        }

        match ListingClient::new(&self.settings.remote, self.fetcher.as_ref())
            .fetch()
            .await
        {
            Ok(listing) => {
                listing.record_folders(folders);
                Ok(listing.assets)
            }
            Err(ListingError::Config(e)) => Err(e.into()),
            Err(e) => {
                log::error!("Remote listing unavailable, continuing with cached files: {}", e);
                Ok(HashMap::new())
            }
        }
    }
}

/// Names used to cross-check container contents: listing first, then the
/// render lists the scene document carries.
fn asset_names(remote: &HashMap<AssetId, RemoteAsset>, scene: &SceneDocument) -> HashMap<AssetId, String> {
    let mut names: HashMap<AssetId, String> = remote
        .values()
        .filter(|a| !a.name.is_empty())
        .map(|a| (a.id, a.name.clone()))
        .collect();

    for render in scene.containers.values().flat_map(|c| c.renders.iter()) {
        if !render.name.is_empty() {
            names.entry(render.id).or_insert_with(|| render.name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use playport_assets::{AssetCacheEntry, IdentityMap};
    use playport_remote::FetchError;
    use std::path::Path;

    // One triangle: (0,0,0) (1,0,0) (0,1,0).
    const TRIANGLE: &str = "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";

    const SCENE: &str = r#"{
        "materials": {"10": {"id": 10, "name": "Rubber"}},
        "containers": {"900": {"id": 900, "name": "Car", "sourceId": 899,
                        "renders": [{"id": 501, "name": "Wheel", "index": 2}]}},
        "root": {"id": "r", "name": "Root", "children": [
            {"id": "e1", "name": "Wheel", "components": {"render":
                {"type": "asset", "asset": 501, "containerAsset": 900, "renderIndex": 2, "materialAssets": [10]}}},
            {"id": "e2", "name": "Floor", "components": {"render": {"type": "plane"}}},
            {"id": "e3", "name": "Crate", "components": {"model": {"asset": 12}}},
            {"id": "e4", "name": "Sun", "components": {"light": {"type": "directional"}}}
        ]}
    }"#;

    fn container_bytes() -> Vec<u8> {
        let doc = serde_json::json!({
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0, 1, 2]}],
            "nodes": [
                {"name": "Body", "mesh": 0},
                {"name": "Door", "mesh": 0},
                {"name": "Wheel", "mesh": 0}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "buffers": [{"byteLength": 36, "uri": TRIANGLE}],
            "bufferViews": [{"buffer": 0, "byteLength": 36}],
            "accessors": [{
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            }]
        });
        serde_json::to_vec(&doc).unwrap()
    }

    #[derive(Default)]
    struct MockFetcher {
        responses: HashMap<String, Vec<u8>>,
        requests: std::sync::Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AssetFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses.get(url).cloned().ok_or_else(|| FetchError::Status {
                code: 403,
                url: url.to_string(),
            })
        }
    }

    fn settings(root: &Path, offline: bool) -> ImportSettings {
        let scene_path = root.join("scene.json");
        std::fs::write(&scene_path, SCENE).unwrap();
        ImportSettings {
            scene_path,
            asset_root: root.join("PlayCanvasData"),
            remote: RemoteConfig {
                project_id: "1".into(),
                branch_id: "b".into(),
                token: "t".into(),
                ..Default::default()
            },
            offline,
        }
    }

    #[tokio::test]
    async fn offline_run_extracts_from_cached_container() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), true);

        let container = settings.asset_root.join("Car_899.glb");
        playport_assets::store::write_atomic(&container, &container_bytes()).unwrap();
        let mut cache = AssetCache::default();
        cache.insert(
            899,
            AssetCacheEntry {
                local_path: container.clone(),
                hash: "abc".into(),
                last_modified: chrono::Utc::now(),
                file_size: 0,
                downloaded_at: chrono::Utc::now(),
                usage_count: 1,
            },
        );
        cache.save(settings.asset_root.join(CACHE_FILE)).unwrap();

        let fetcher = Arc::new(MockFetcher::default());
        let outcome = ImportPipeline::new(settings.clone(), fetcher.clone(), CancelFlag::new())
            .run()
            .await
            .unwrap();

        assert!(fetcher.requests().is_empty());
        assert!(outcome.report.is_none());
        assert_eq!(outcome.statistics.directional_lights, 1);

        let wheel = &outcome.processed[&501];
        assert_eq!(wheel.mesh.name, "Wheel");
        assert_eq!(wheel.sub_index, Some(2));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, 12);

        let mapping = AssetIdMapping::load(settings.asset_root.join(ID_MAPPING_FILE));
        assert_eq!(mapping.path_by_id(501), Some(container));

        let mut assembler = SummaryAssembler::default();
        assembler.assemble(&outcome.scene, &outcome.processed);
        assert_eq!(assembler.placed, 1);
        assert_eq!(assembler.placeholders, vec![("Root/Crate".to_string(), 12)]);
    }

    #[tokio::test]
    async fn online_run_downloads_then_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), false);

        let listing = serde_json::json!({"result": [
            {"id": 899, "name": "Car.glb", "type": "container",
             "file": {"filename": "Car.glb", "size": 512, "hash": "abc", "url": "/api/assets/899/file/Car.glb"}},
            {"id": 12, "name": "Crate.glb", "type": "model", "sourceId": 11,
             "file": {"filename": "Crate.glb", "size": 64, "hash": "def", "url": "/api/assets/12/file/Crate.glb"}},
            {"id": 501, "name": "Wheel", "type": "render"}
        ]});
        let mut fetcher = MockFetcher::default();
        fetcher.responses.insert(
            settings.remote.listing_url(0),
            serde_json::to_vec(&listing).unwrap(),
        );
        fetcher.responses.insert(
            "https://playcanvas.com/api/assets/899/file/Car.glb?branchId=b".into(),
            container_bytes(),
        );
        let fetcher = Arc::new(fetcher);

        let outcome = ImportPipeline::new(settings.clone(), fetcher.clone(), CancelFlag::new())
            .run()
            .await
            .unwrap();

        let report = outcome.report.as_ref().unwrap();
        assert_eq!(report.succeeded, vec![899]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 12);

        let requests = fetcher.requests();
        assert_eq!(
            requests
                .iter()
                .filter(|u| u.contains("/api/assets/11/file/Crate.fbx"))
                .count(),
            1
        );

        assert_eq!(outcome.processed[&501].mesh.name, "Wheel");
        let cache = AssetCache::load(settings.asset_root.join(CACHE_FILE));
        assert_eq!(cache.get(899).map(|e| e.hash.as_str()), Some("abc"));
        assert!(!cache.contains(12));
    }

    #[tokio::test]
    async fn missing_credentials_abort_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), false);
        settings.remote.token.clear();

        let fetcher = Arc::new(MockFetcher::default());
        let err = ImportPipeline::new(settings, fetcher.clone(), CancelFlag::new())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Config(ConfigError::MissingToken)));
        assert!(fetcher.requests().is_empty());
    }
}
