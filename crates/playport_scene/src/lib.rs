use std::{collections::HashMap, path::Path};

use playport_core::AssetId;
use serde_json::Value;

pub mod components;
pub mod dictionaries;
mod entity;
mod error;
pub mod json;
pub mod stats;
pub mod transform;

pub use components::{Component, LightComponent, ModelComponent, RenderComponent};
pub use dictionaries::{
    ContainerDescriptor, MaterialDescriptor, ModelDescriptor, RenderInfo, SceneSettings,
    TextureDescriptor,
};
pub use entity::Entity;
pub use error::SceneError;
pub use stats::SceneStatistics;

/// The exported document: the entity tree plus the global dictionaries.
/// Built once per import run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SceneDocument {
    pub root: Entity,
    pub materials: HashMap<AssetId, MaterialDescriptor>,
    pub textures: HashMap<AssetId, TextureDescriptor>,
    pub containers: HashMap<AssetId, ContainerDescriptor>,
    pub models: HashMap<AssetId, ModelDescriptor>,
    pub settings: SceneSettings,
}

impl SceneDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let document = Self::from_json_str(&text)?;
        log::info!(
            "Scene loaded from {:?}: {} entities, {} materials, {} textures, {} containers, {} models",
            path,
            document.root.count(),
            document.materials.len(),
            document.textures.len(),
            document.containers.len(),
            document.models.len()
        );
        Ok(document)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        let raw: Value = serde_json::from_str(text)?;

        let root = match raw.get("root") {
            Some(root @ Value::Object(_)) => serde_json::from_value::<Entity>(root.clone())?,
            _ => return Err(SceneError::MissingRoot),
        };

        Ok(Self {
            root,
            materials: dictionaries::decode_dictionary(
                "material",
                raw.get("materials"),
                MaterialDescriptor::from_json,
            ),
            textures: dictionaries::decode_dictionary(
                "texture",
                raw.get("textures"),
                TextureDescriptor::from_json,
            ),
            containers: dictionaries::decode_dictionary(
                "container",
                raw.get("containers"),
                ContainerDescriptor::from_json,
            ),
            models: dictionaries::decode_dictionary(
                "model",
                raw.get("models"),
                ModelDescriptor::from_json,
            ),
            settings: raw
                .get("scene")
                .map(SceneSettings::from_json)
                .unwrap_or_default(),
        })
    }
}
