use std::{collections::HashMap, path::PathBuf};

use playport_core::AssetId;

use crate::material::MaterialData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A contiguous index range drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub index_start: usize,
    pub index_count: usize,
    /// Index into the owning asset's material list.
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Final resolved unit handed to the scene assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedAsset {
    pub asset_id: AssetId,
    pub source_path: PathBuf,
    /// Position inside a shared container, `None` for plain models.
    pub sub_index: Option<usize>,
    pub mesh: MeshData,
    pub materials: Vec<MaterialData>,
    pub submesh_names: Vec<String>,
}

pub type ProcessedAssets = HashMap<AssetId, ProcessedAsset>;
