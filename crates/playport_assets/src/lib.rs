pub mod assets;
pub mod cache;
pub mod collector;
mod error;
pub mod extract;
pub mod mapping;
pub mod material;
pub mod status;
pub mod store;

pub use assets::{MeshData, ProcessedAsset, ProcessedAssets, SubMesh, Vertex};
pub use cache::{AssetCache, AssetCacheEntry};
pub use collector::{AssetUsageInfo, CollectedDependencies, DependencyCollector, collect};
pub use error::{ExtractError, StoreError};
pub use extract::{AssetNames, ContainerExtractor, resolve_render_index};
pub use mapping::{
    AssetIdMapping, FolderMapping, FolderPaths, IdentityMap, NativeAssetType, NativeResource,
};
pub use material::{MaterialData, MaterialSettings};
pub use status::{AssetStatus, StatusResolver};

/// File names of the persisted stores inside the asset root.
pub const CACHE_FILE: &str = "AssetCache.json";
pub const ID_MAPPING_FILE: &str = "AssetIDMapping.json";
pub const FOLDER_MAPPING_FILE: &str = "FolderMapping.json";
