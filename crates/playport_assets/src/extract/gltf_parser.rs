use std::{collections::HashSet, io::Read, path::Path};

use gltf::{Document, mesh::Mode};

use crate::{
    assets::{MeshData, SubMesh, Vertex},
    error::ExtractError,
    material::{MaterialData, MaterialSettings, TextureRef},
};

const FBX_BINARY_MAGIC: &[u8] = b"Kaydara FBX Binary";
const FBX_ASCII_MAGIC: &[u8] = b"; FBX";

/// One mesh-bearing node of a container, with the materials its primitives use.
#[derive(Debug, Clone)]
pub(crate) struct ContainerMesh {
    pub name: String,
    pub mesh: MeshData,
    pub materials: Vec<MaterialData>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ContainerContents {
    /// Mesh-bearing nodes in hierarchy pre-order: the order indices were assigned in.
    pub node_meshes: Vec<ContainerMesh>,
    /// Meshes no node in the hierarchy points at.
    pub loose_meshes: Vec<ContainerMesh>,
}

pub(crate) fn load_container(path: &Path) -> Result<ContainerContents, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::MissingFile(path.to_path_buf()));
    }
    if let Some(format) = sniff_unsupported(path)? {
        return Err(ExtractError::UnsupportedFormat {
            path: path.to_path_buf(),
            format,
        });
    }

    let load_err = |source| ExtractError::Load {
        path: path.to_path_buf(),
        source,
    };

    // Buffers only: embedded images are referenced by name, never decoded.
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(load_err)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(load_err)?;

    let materials: Vec<MaterialData> = document.materials().map(|m| convert_material(&m)).collect();

    let mut contents = ContainerContents::default();
    let mut used_meshes = HashSet::new();

    for node in hierarchy_order(&document) {
        let Some(mesh) = node.mesh() else { continue };
        used_meshes.insert(mesh.index());

        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Node_{}", node.index()));
        contents
            .node_meshes
            .push(read_mesh(&mesh, name, &buffers, &materials));
    }

    for mesh in document.meshes().filter(|m| !used_meshes.contains(&m.index())) {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Mesh_{}", mesh.index()));
        contents
            .loose_meshes
            .push(read_mesh(&mesh, name, &buffers, &materials));
    }

    log::debug!(
        "Loaded {:?}: {} node meshes, {} loose meshes",
        path,
        contents.node_meshes.len(),
        contents.loose_meshes.len()
    );
    Ok(contents)
}

fn sniff_unsupported(path: &Path) -> Result<Option<&'static str>, ExtractError> {
    let mut header = [0u8; 32];
    let read = std::fs::File::open(path)
        .and_then(|mut file| file.read(&mut header))
        .map_err(|e| ExtractError::Load {
            path: path.to_path_buf(),
            source: gltf::Error::Io(e),
        })?;

    let header = &header[..read];
    if header.starts_with(FBX_BINARY_MAGIC) || header.starts_with(FBX_ASCII_MAGIC) {
        return Ok(Some("fbx"));
    }
    Ok(None)
}

/// Depth-first pre-order over the default scene (or the first one).
/// Files without scenes fall back to parentless nodes in index order.
fn hierarchy_order(document: &Document) -> Vec<gltf::Node<'_>> {
    let roots: Vec<gltf::Node<'_>> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => {
            let children: HashSet<usize> = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()).collect::<Vec<_>>())
                .collect();
            document
                .nodes()
                .filter(|n| !children.contains(&n.index()))
                .collect()
        }
    };

    let mut ordered = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<gltf::Node<'_>> = roots.into_iter().rev().collect();

    while let Some(node) = stack.pop() {
        if !visited.insert(node.index()) {
            continue;
        }
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
        ordered.push(node);
    }
    ordered
}

fn read_mesh(
    mesh: &gltf::Mesh<'_>,
    name: String,
    buffers: &[gltf::buffer::Data],
    all_materials: &[MaterialData],
) -> ContainerMesh {
    let mut data = MeshData {
        name: name.clone(),
        ..Default::default()
    };
    let mut materials: Vec<MaterialData> = Vec::new();
    let mut material_slots: Vec<usize> = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::warn!(
                "Skipping non-triangle primitive {} of mesh '{}'",
                primitive.index(),
                name
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(positions) = reader.read_positions().map(|iter| iter.collect::<Vec<[f32; 3]>>())
        else {
            log::warn!("Primitive {} of mesh '{}' has no positions", primitive.index(), name);
            continue;
        };

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|read| read.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

        // Non-indexed primitives draw their vertices in order.
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|read| read.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let base = data.vertices.len() as u32;
        data.vertices
            .extend(positions.iter().enumerate().map(|(i, position)| Vertex {
                position: *position,
                normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            }));

        let index_start = data.indices.len();
        data.indices.extend(indices.iter().map(|i| i + base));

        // Primitives without a material get none rather than a made-up one.
        let material = primitive.material().index().and_then(|gltf_index| {
            let slot = match material_slots.iter().position(|s| *s == gltf_index) {
                Some(slot) => slot,
                None => {
                    let source = all_materials.get(gltf_index)?;
                    material_slots.push(gltf_index);
                    materials.push(source.clone());
                    materials.len() - 1
                }
            };
            Some(slot)
        });

        data.submeshes.push(SubMesh {
            name: format!("{}_{}", name, primitive.index()),
            index_start,
            index_count: indices.len(),
            material,
        });
    }

    ContainerMesh {
        name,
        mesh: data,
        materials,
    }
}

fn convert_material(material: &gltf::Material<'_>) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();

    MaterialData {
        name: material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Material_{}", material.index().unwrap_or(0))),
        settings: MaterialSettings {
            base_color: pbr.base_color_factor(),
            emissive: material.emissive_factor(),
            roughness: pbr.roughness_factor(),
            metallic: pbr.metallic_factor(),
        },
        diffuse_texture: pbr.base_color_texture().map(|info| texture_ref(&info.texture())),
        normal_texture: material.normal_texture().map(|info| texture_ref(&info.texture())),
        metallic_roughness_texture: pbr
            .metallic_roughness_texture()
            .map(|info| texture_ref(&info.texture())),
        occlusion_texture: material.occlusion_texture().map(|info| texture_ref(&info.texture())),
    }
}

fn texture_ref(texture: &gltf::Texture<'_>) -> TextureRef {
    let image = texture.source();
    if let Some(name) = image.name() {
        return name.to_string();
    }
    match image.source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => uri.to_string(),
        _ => format!("Image_{}", image.index()),
    }
}
