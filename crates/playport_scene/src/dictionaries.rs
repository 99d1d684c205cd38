//! Global dictionaries the exporter writes next to the entity tree.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use playport_core::{AssetId, AssetKind, FolderId, RemoteAsset};
use serde_json::Value;

use crate::{json, transform::read_vec3};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDescriptor {
    pub id: AssetId,
    pub name: String,
    pub diffuse: [f32; 3],
    pub emissive: [f32; 3],
    pub opacity: f32,
    pub metalness: f32,
    pub gloss: f32,
    /// Texture slot (`diffuseMap`, `normalMap`, ...) to texture asset.
    pub textures: BTreeMap<String, AssetId>,
}

impl MaterialDescriptor {
    pub fn from_json(id: AssetId, raw: &Value) -> Self {
        let mut textures = BTreeMap::new();
        if let Some(Value::Object(slots)) = raw.get("textures") {
            for (slot, value) in slots {
                let texture = json::asset_id(Some(value));
                if texture != 0 {
                    textures.insert(slot.clone(), texture);
                }
            }
        }

        Self {
            id,
            name: json::opt_string(raw.get("name")).unwrap_or_default(),
            diffuse: json::color3(raw.get("diffuse")),
            emissive: raw
                .get("emissive")
                .map(|v| json::color3(Some(v)))
                .unwrap_or([0.0; 3]),
            opacity: json::opt_f32(raw.get("opacity")).unwrap_or(1.0),
            metalness: json::opt_f32(raw.get("metalness")).unwrap_or(0.0),
            gloss: json::opt_f32(raw.get("gloss")).unwrap_or(0.25),
            textures,
        }
    }

    pub fn texture_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.textures.values().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureDescriptor {
    pub id: AssetId,
    pub name: String,
    pub kind: String,
    /// Folder chain, root first.
    pub path: Vec<FolderId>,
    pub file_name: Option<String>,
    pub url: Option<String>,
    pub size: u64,
    pub hash: Option<String>,
}

impl TextureDescriptor {
    pub fn from_json(id: AssetId, raw: &Value) -> Self {
        let path = match raw.get("path") {
            Some(Value::Array(items)) => items.iter().map(|v| json::asset_id(Some(v))).collect(),
            _ => Vec::new(),
        };

        Self {
            id,
            name: json::opt_string(raw.get("name")).unwrap_or_default(),
            kind: json::opt_string(raw.get("type")).unwrap_or_else(|| "texture".into()),
            path,
            file_name: json::opt_string(raw.get("filename")),
            url: json::opt_string(raw.get("url")),
            size: raw.get("size").and_then(Value::as_u64).unwrap_or(0),
            hash: json::opt_string(raw.get("hash")),
        }
    }

    /// Stand-in remote descriptor for a texture the listing did not return.
    pub fn to_remote_asset(&self) -> RemoteAsset {
        RemoteAsset {
            id: self.id,
            name: self.name.clone(),
            kind: AssetKind::Texture,
            folder: self.path.last().copied().unwrap_or(0),
            file_name: self.file_name.clone(),
            size: self.size,
            hash: self.hash.clone().unwrap_or_default(),
            modified_at: None,
            url: self.url.clone().unwrap_or_default(),
            source_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInfo {
    pub id: AssetId,
    pub name: String,
    pub index: u32,
}

/// A multi-mesh bundle and the render assets packed inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerDescriptor {
    pub id: AssetId,
    pub name: String,
    /// The downloadable binary.
    pub source_id: Option<AssetId>,
    pub renders: Vec<RenderInfo>,
}

impl ContainerDescriptor {
    pub fn from_json(id: AssetId, raw: &Value) -> Self {
        let mut renders = Vec::new();
        if let Some(Value::Array(items)) = raw.get("renders") {
            for item in items {
                let render_id = json::asset_id(item.get("id"));
                // The exporter writes `index: undefined` for index 0 in some versions.
                let index = json::opt_u32(item.get("index")).unwrap_or(0);
                if render_id == 0 {
                    log::warn!("Container {} lists a render without an id, skipping", id);
                    continue;
                }
                renders.push(RenderInfo {
                    id: render_id,
                    name: json::opt_string(item.get("name")).unwrap_or_default(),
                    index,
                });
            }
        }

        Self {
            id,
            name: json::opt_string(raw.get("name")).unwrap_or_default(),
            source_id: json::opt_asset_id(raw.get("sourceId")),
            renders,
        }
    }

    pub fn render(&self, render_id: AssetId) -> Option<&RenderInfo> {
        self.renders.iter().find(|r| r.id == render_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDescriptor {
    pub id: AssetId,
    pub name: String,
    pub kind: String,
    pub path: Vec<FolderId>,
}

impl ModelDescriptor {
    pub fn from_json(id: AssetId, raw: &Value) -> Self {
        let path = match raw.get("path") {
            Some(Value::Array(items)) => items.iter().map(|v| json::asset_id(Some(v))).collect(),
            _ => Vec::new(),
        };
        Self {
            id,
            name: json::opt_string(raw.get("name")).unwrap_or_default(),
            kind: json::opt_string(raw.get("type")).unwrap_or_else(|| "model".into()),
            path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkyboxSettings {
    pub texture: Option<AssetId>,
    pub intensity: f32,
    pub rotation: Vec3,
}

/// Ambient/skybox settings. Carried through for the scene assembler only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSettings {
    pub skybox: Option<SkyboxSettings>,
    pub ambient_light: Option<[f32; 3]>,
    pub layers: Value,
}

impl SceneSettings {
    pub fn from_json(raw: &Value) -> Self {
        let skybox = raw.get("skybox").filter(|v| v.is_object()).map(|sky| SkyboxSettings {
            texture: json::opt_asset_id(sky.get("texture")),
            intensity: json::opt_f32(sky.get("intensity")).unwrap_or(1.0),
            rotation: read_vec3(sky.get("rotation")).unwrap_or(Vec3::ZERO),
        });

        Self {
            skybox,
            ambient_light: raw
                .get("ambientLight")
                .filter(|v| v.is_array())
                .map(|v| json::color3(Some(v))),
            layers: raw.get("layers").cloned().unwrap_or(Value::Null),
        }
    }
}

/// Decodes an `{ "<id>": {...} }` dictionary. Entries whose key is not an
/// integer fall back to their `id` field; entries with neither are skipped.
pub(crate) fn decode_dictionary<T>(
    label: &str,
    raw: Option<&Value>,
    decode: impl Fn(AssetId, &Value) -> T,
) -> HashMap<AssetId, T> {
    let mut out = HashMap::new();
    let Some(Value::Object(entries)) = raw else {
        return out;
    };

    for (key, value) in entries {
        if !value.is_object() {
            log::warn!("Ignoring {} entry '{}': not an object", label, key);
            continue;
        }
        let id = key
            .trim()
            .parse::<AssetId>()
            .ok()
            .filter(|id| *id != 0)
            .or_else(|| json::opt_asset_id(value.get("id")));

        match id {
            Some(id) => {
                out.insert(id, decode(id, value));
            }
            None => log::warn!("Ignoring {} entry '{}': no usable id", label, key),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn material_textures_skip_empty_slots() {
        let m = MaterialDescriptor::from_json(
            10,
            &json!({"name": "Paint", "textures": {"diffuseMap": 77, "normalMap": null, "aoMap": "78"}}),
        );
        assert_eq!(m.texture_ids().collect::<Vec<_>>(), vec![78, 77]);
        assert_eq!(m.name, "Paint");
    }

    #[test]
    fn container_looks_up_renders_by_id() {
        let c = ContainerDescriptor::from_json(
            900,
            &json!({"name": "Car.glb", "sourceId": 899, "renders": [
                {"id": 500, "name": "Body", "index": 0},
                {"id": 501, "name": "Wheel", "index": 2}
            ]}),
        );
        assert_eq!(c.source_id, Some(899));
        assert_eq!(c.render(501).map(|r| r.index), Some(2));
        assert!(c.render(502).is_none());
    }

    #[test]
    fn texture_falls_back_to_remote_descriptor() {
        let t = TextureDescriptor::from_json(
            77,
            &json!({"name": "rust", "path": [4, 9], "filename": "rust.png", "url": "/api/assets/77/file/rust.png", "size": 2048, "hash": "abc"}),
        );
        let remote = t.to_remote_asset();
        assert_eq!(remote.folder, 9);
        assert_eq!(remote.kind, AssetKind::Texture);
        assert_eq!(remote.hash, "abc");
        assert_eq!(remote.size, 2048);
    }

    #[test]
    fn dictionary_skips_unusable_entries() {
        let raw = json!({"5": {"name": "a"}, "x": {"id": 6}, "y": {"name": "b"}, "7": 3});
        let dict = decode_dictionary("model", Some(&raw), ModelDescriptor::from_json);
        let mut keys: Vec<_> = dict.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![5, 6]);
    }
}
