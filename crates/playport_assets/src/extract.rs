//! Demultiplexes downloaded container files into the logical assets the scene references.

mod gltf_parser;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use playport_core::AssetId;
use playport_scene::ContainerDescriptor;

use crate::{
    assets::ProcessedAsset,
    error::ExtractError,
    extract::gltf_parser::{ContainerContents, ContainerMesh},
    mapping::{IdentityMap, NativeAssetType, NativeResource},
    material::MaterialData,
};

/// Source of human-readable names for logical assets.
pub trait AssetNames {
    fn asset_name(&self, asset_id: AssetId) -> Option<&str>;
}

impl AssetNames for HashMap<AssetId, String> {
    fn asset_name(&self, asset_id: AssetId) -> Option<&str> {
        self.get(&asset_id).map(String::as_str)
    }
}

/// Position of `render_id` inside its container.
///
/// The container's render list wins over the index stored on the component.
pub fn resolve_render_index(
    render_id: AssetId,
    container: Option<&ContainerDescriptor>,
    component_index: Option<u32>,
) -> u32 {
    let listed = container.and_then(|c| c.render(render_id)).map(|r| r.index);

    match (listed, component_index) {
        (Some(listed), Some(component)) if listed != component => {
            log::warn!(
                "Render {} index disagreement: container lists {}, component says {}. Using {}",
                render_id,
                listed,
                component,
                listed
            );
            listed
        }
        (Some(listed), _) => listed,
        (None, Some(component)) => component,
        (None, None) => {
            log::warn!("Render {} has no known container index, using 0", render_id);
            0
        }
    }
}

pub struct ContainerExtractor<'a> {
    names: &'a dyn AssetNames,
    identity: &'a mut dyn IdentityMap,
    loaded: HashMap<PathBuf, ContainerContents>,
}

impl<'a> ContainerExtractor<'a> {
    pub fn new(names: &'a dyn AssetNames, identity: &'a mut dyn IdentityMap) -> Self {
        Self {
            names,
            identity,
            loaded: HashMap::new(),
        }
    }

    fn contents(&mut self, path: &Path) -> Result<&ContainerContents, ExtractError> {
        if !self.loaded.contains_key(path) {
            let contents = gltf_parser::load_container(path)?;
            self.loaded.insert(path.to_path_buf(), contents);
        }
        self.loaded
            .get(path)
            .ok_or_else(|| ExtractError::MissingFile(path.to_path_buf()))
    }

    /// Pulls the sub-mesh at `mesh_index` out of a shared container.
    /// The index is authoritative; a differing name only warns.
    pub fn extract(
        &mut self,
        container_path: &Path,
        mesh_index: usize,
        expected_id: AssetId,
    ) -> Result<ProcessedAsset, ExtractError> {
        let contents = self.contents(container_path)?;
        let count = contents.node_meshes.len();
        if count == 0 {
            return Err(ExtractError::NoMeshes(container_path.to_path_buf()));
        }

        let Some(selected) = contents.node_meshes.get(mesh_index).cloned() else {
            return Err(ExtractError::OutOfRange {
                index: mesh_index,
                count,
                path: container_path.to_path_buf(),
            });
        };

        if selected.mesh.is_empty() {
            return Err(ExtractError::EmptyMesh {
                index: mesh_index,
                path: container_path.to_path_buf(),
            });
        }

        if let Some(expected) = self.names.asset_name(expected_id) {
            if !names_match(expected, &selected.name) {
                log::warn!(
                    "Asset {} expected '{}' at index {} of {:?}, found '{}'. Keeping the index",
                    expected_id,
                    expected,
                    mesh_index,
                    container_path,
                    selected.name
                );
            }
        }

        let asset = into_processed(expected_id, container_path, Some(mesh_index), selected, false);
        self.identity.register(
            expected_id,
            NativeAssetType::Model,
            NativeResource {
                path: container_path.to_path_buf(),
                sub_index: Some(mesh_index),
            },
        );
        log::info!(
            "Extracted asset {} ('{}') from {:?} index {}: {} vertices, {} materials",
            expected_id,
            asset.mesh.name,
            container_path,
            mesh_index,
            asset.mesh.vertices.len(),
            asset.materials.len()
        );
        Ok(asset)
    }

    /// Plain model file: the first mesh in the hierarchy wins, then any mesh at all.
    pub fn process_model(
        &mut self,
        model_path: &Path,
        model_id: AssetId,
    ) -> Result<ProcessedAsset, ExtractError> {
        let contents = self.contents(model_path)?;
        let first = contents
            .node_meshes
            .iter()
            .chain(contents.loose_meshes.iter())
            .find(|m| !m.mesh.is_empty())
            .cloned();

        let Some(selected) = first else {
            return Err(ExtractError::NoMeshes(model_path.to_path_buf()));
        };

        let asset = into_processed(model_id, model_path, None, selected, true);
        self.identity.register(
            model_id,
            NativeAssetType::Model,
            NativeResource {
                path: model_path.to_path_buf(),
                sub_index: None,
            },
        );
        log::info!(
            "Processed model {} from {:?}: {} vertices",
            model_id,
            model_path,
            asset.mesh.vertices.len()
        );
        Ok(asset)
    }
}

fn names_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

fn into_processed(
    asset_id: AssetId,
    path: &Path,
    sub_index: Option<usize>,
    source: ContainerMesh,
    with_fallback_material: bool,
) -> ProcessedAsset {
    let mut materials = source.materials;
    if materials.is_empty() && with_fallback_material {
        materials.push(MaterialData::fallback());
    }

    ProcessedAsset {
        asset_id,
        source_path: path.to_path_buf(),
        sub_index,
        submesh_names: source.mesh.submeshes.iter().map(|s| s.name.clone()).collect(),
        mesh: source.mesh,
        materials,
    }
}
