//! Walks the entity tree and gathers every asset the scene actually references.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use playport_core::{AssetId, AssetKind};
use playport_scene::{Component, Entity, MaterialDescriptor, RenderComponent};

/// Who references an asset. Sets, so repeat references collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUsageInfo {
    pub asset_id: AssetId,
    pub kind: AssetKind,
    pub used_by_entities: BTreeSet<String>,
    pub used_by_paths: BTreeSet<String>,
    pub container_asset_id: Option<AssetId>,
    pub render_index: Option<u32>,
    /// Position in the traversal at which the asset was first seen.
    pub discovery: usize,
}

impl AssetUsageInfo {
    pub fn usage_count(&self) -> usize {
        self.used_by_entities.len()
    }
}

pub type UsageTable = BTreeMap<AssetId, AssetUsageInfo>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedDependencies {
    pub models: UsageTable,
    pub render_assets: UsageTable,
    pub materials: UsageTable,
    pub textures: UsageTable,
    pub render_to_container: BTreeMap<AssetId, AssetId>,
    pub model_to_materials: BTreeMap<AssetId, BTreeSet<AssetId>>,
    pub material_to_textures: BTreeMap<AssetId, BTreeSet<AssetId>>,
}

impl CollectedDependencies {
    pub fn total(&self) -> usize {
        self.models.len() + self.render_assets.len() + self.materials.len() + self.textures.len()
    }
}

pub struct DependencyCollector<'a> {
    materials: &'a HashMap<AssetId, MaterialDescriptor>,
    deps: CollectedDependencies,
    discovered: usize,
}

impl<'a> DependencyCollector<'a> {
    pub fn new(materials: &'a HashMap<AssetId, MaterialDescriptor>) -> Self {
        Self {
            materials,
            deps: CollectedDependencies::default(),
            discovered: 0,
        }
    }

    pub fn collect(mut self, root: &Entity) -> CollectedDependencies {
        root.walk(&mut |entity, path| self.visit(entity, path));

        let deps = self.deps;
        log::info!(
            "Collected dependencies: {} models, {} render assets, {} materials, {} textures, {} container-backed renders",
            deps.models.len(),
            deps.render_assets.len(),
            deps.materials.len(),
            deps.textures.len(),
            deps.render_to_container.len()
        );
        deps
    }

    fn visit(&mut self, entity: &Entity, path: &str) {
        // Both components are handled when present.
        match entity.component("model") {
            Some(Component::Model(model)) => {
                if model.asset != 0 {
                    self.upsert(AssetKind::Model, model.asset, entity, path);
                    if !model.material_assets.is_empty() {
                        self.deps
                            .model_to_materials
                            .entry(model.asset)
                            .or_default()
                            .extend(model.material_assets.iter().copied());
                    }
                }
                self.register_materials(&model.material_assets, entity, path);
            }
            Some(other) => log::error!(
                "Entity '{}' ({}) has an unreadable model component: {:?}",
                entity.display_name(),
                path,
                other
            ),
            None => {}
        }

        match entity.component("render") {
            Some(Component::Render(RenderComponent::Asset {
                asset,
                container_asset,
                render_index,
                material_assets,
                ..
            })) => {
                if *asset != 0 {
                    self.upsert(AssetKind::Render, *asset, entity, path);
                    if let (Some(container), Some(index)) = (container_asset, render_index) {
                        self.deps.render_to_container.insert(*asset, *container);
                        if let Some(usage) = self.deps.render_assets.get_mut(asset) {
                            usage.container_asset_id = Some(*container);
                            usage.render_index = Some(*index);
                        }
                    }
                }
                self.register_materials(material_assets, entity, path);
            }
            Some(Component::Render(RenderComponent::Primitive { .. })) | None => {}
            Some(other) => log::error!(
                "Entity '{}' ({}) has an unreadable render component: {:?}",
                entity.display_name(),
                path,
                other
            ),
        }
    }

    fn register_materials(&mut self, material_ids: &[AssetId], entity: &Entity, path: &str) {
        for &material_id in material_ids.iter().filter(|id| **id != 0) {
            self.upsert(AssetKind::Material, material_id, entity, path);

            let materials = self.materials;
            let Some(material) = materials.get(&material_id) else {
                log::debug!("Material {} is not in the scene dictionary", material_id);
                continue;
            };

            for texture_id in material.texture_ids() {
                self.upsert(AssetKind::Texture, texture_id, entity, path);
                self.deps
                    .material_to_textures
                    .entry(material_id)
                    .or_default()
                    .insert(texture_id);
            }
        }
    }

    fn upsert(&mut self, kind: AssetKind, asset_id: AssetId, entity: &Entity, path: &str) {
        let table = match kind {
            AssetKind::Model => &mut self.deps.models,
            AssetKind::Render => &mut self.deps.render_assets,
            AssetKind::Material => &mut self.deps.materials,
            _ => &mut self.deps.textures,
        };

        let discovered = &mut self.discovered;
        let usage = table.entry(asset_id).or_insert_with(|| {
            *discovered += 1;
            AssetUsageInfo {
                asset_id,
                kind,
                used_by_entities: BTreeSet::new(),
                used_by_paths: BTreeSet::new(),
                container_asset_id: None,
                render_index: None,
                discovery: *discovered,
            }
        });
        usage.used_by_entities.insert(entity.id.clone());
        usage.used_by_paths.insert(path.to_string());
    }
}

pub fn collect(
    root: &Entity,
    materials: &HashMap<AssetId, MaterialDescriptor>,
) -> CollectedDependencies {
    DependencyCollector::new(materials).collect(root)
}
