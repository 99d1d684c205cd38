use playport_core::AssetId;
use serde_json::Value;

use crate::json;

/// A component payload, decoded by the component's name and, for `render`,
/// by its declared `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Light(LightComponent),
    Model(ModelComponent),
    Render(RenderComponent),
    Camera(CameraComponent),
    /// Anything we do not model, or a known kind whose payload was not an object.
    /// The raw payload is kept so nothing is silently dropped.
    Unknown { name: String, raw: Value },
}

impl Component {
    pub fn decode(name: &str, raw: Value) -> Self {
        if !raw.is_object() {
            if matches!(name, "light" | "model" | "render" | "camera") {
                log::warn!("Component '{}' payload is not an object, keeping it raw", name);
            }
            return Component::Unknown {
                name: name.to_string(),
                raw,
            };
        }

        match name {
            "light" => Component::Light(LightComponent::from_json(&raw)),
            "model" => Component::Model(ModelComponent::from_json(&raw)),
            "render" => Component::Render(RenderComponent::from_json(&raw)),
            "camera" => Component::Camera(CameraComponent::from_json(&raw)),
            _ => Component::Unknown {
                name: name.to_string(),
                raw,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelComponent {
    /// `0` when the component carries no model reference.
    pub asset: AssetId,
    pub material_assets: Vec<AssetId>,
}

impl ModelComponent {
    fn from_json(raw: &Value) -> Self {
        Self {
            asset: json::asset_id(raw.get("asset")),
            material_assets: json::asset_id_list(raw.get("materialAssets")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub enabled: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub is_static: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cast_shadows: true,
            receive_shadows: true,
            is_static: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderComponent {
    /// `type: "asset"`: references a render asset, possibly packed in a container.
    Asset {
        asset: AssetId,
        container_asset: Option<AssetId>,
        render_index: Option<u32>,
        material_assets: Vec<AssetId>,
        settings: RenderSettings,
    },
    /// Built-in shape (`box`, `sphere`, `plane`, ...). Carries no asset dependencies.
    Primitive {
        shape: String,
        material_assets: Vec<AssetId>,
        settings: RenderSettings,
    },
}

impl RenderComponent {
    fn from_json(raw: &Value) -> Self {
        let defaults = RenderSettings::default();
        let settings = RenderSettings {
            enabled: json::opt_bool(raw.get("enabled")).unwrap_or(defaults.enabled),
            cast_shadows: json::opt_bool(raw.get("castShadows")).unwrap_or(defaults.cast_shadows),
            receive_shadows: json::opt_bool(raw.get("receiveShadows"))
                .unwrap_or(defaults.receive_shadows),
            is_static: json::opt_bool(raw.get("isStatic")).unwrap_or(defaults.is_static),
        };
        let material_assets = json::asset_id_list(raw.get("materialAssets"));
        let kind = raw.get("type").and_then(Value::as_str).unwrap_or("");

        if kind == "asset" {
            RenderComponent::Asset {
                asset: json::asset_id(raw.get("asset")),
                container_asset: json::opt_asset_id(raw.get("containerAsset")),
                render_index: json::opt_u32(raw.get("renderIndex")),
                material_assets,
                settings,
            }
        } else {
            RenderComponent::Primitive {
                shape: kind.to_string(),
                material_assets,
                settings,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightShape {
    Punctual,
    Rectangle,
    Disk,
    Sphere,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    pub kind: LightKind,
    pub shape: LightShape,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
    pub cast_shadows: bool,
    pub is_static: bool,
    pub enabled: bool,
}

impl LightComponent {
    fn from_json(raw: &Value) -> Self {
        let kind = match raw
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("directional") => LightKind::Directional,
            Some("point") | Some("omni") => LightKind::Point,
            Some("spot") => LightKind::Spot,
            _ => LightKind::Other,
        };
        let shape = match json::opt_u32(raw.get("shape")).unwrap_or(0) {
            1 => LightShape::Rectangle,
            2 => LightShape::Disk,
            3 => LightShape::Sphere,
            _ => LightShape::Punctual,
        };

        Self {
            kind,
            shape,
            color: json::color3(raw.get("color")),
            intensity: json::opt_f32(raw.get("intensity")).unwrap_or(1.0),
            range: json::opt_f32(raw.get("range")).unwrap_or(10.0),
            inner_cone_angle: json::opt_f32(raw.get("innerConeAngle")).unwrap_or(40.0),
            outer_cone_angle: json::opt_f32(raw.get("outerConeAngle")).unwrap_or(45.0),
            cast_shadows: json::opt_bool(raw.get("castShadows")).unwrap_or(false),
            is_static: json::opt_bool(raw.get("isStatic")).unwrap_or(false),
            enabled: json::opt_bool(raw.get("enabled")).unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    pub fov: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl CameraComponent {
    fn from_json(raw: &Value) -> Self {
        Self {
            fov: json::opt_f32(raw.get("fov")).unwrap_or(45.0),
            near_clip: json::opt_f32(raw.get("nearClip")).unwrap_or(0.1),
            far_clip: json::opt_f32(raw.get("farClip")).unwrap_or(1000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_asset_decodes_container_reference() {
        let c = Component::decode(
            "render",
            json!({"type": "asset", "asset": 501, "containerAsset": 900, "renderIndex": 2, "materialAssets": [10]}),
        );
        match c {
            Component::Render(RenderComponent::Asset {
                asset,
                container_asset,
                render_index,
                material_assets,
                ..
            }) => {
                assert_eq!(asset, 501);
                assert_eq!(container_asset, Some(900));
                assert_eq!(render_index, Some(2));
                assert_eq!(material_assets, vec![10]);
            }
            other => panic!("unexpected component {:?}", other),
        }
    }

    #[test]
    fn render_without_asset_type_is_primitive() {
        let c = Component::decode("render", json!({"type": "box", "materialAssets": [3]}));
        assert!(matches!(
            c,
            Component::Render(RenderComponent::Primitive { ref shape, .. }) if shape == "box"
        ));
    }

    #[test]
    fn unknown_components_keep_their_payload() {
        let raw = json!({"scripts": {"rotate": {}}});
        let c = Component::decode("script", raw.clone());
        assert_eq!(
            c,
            Component::Unknown {
                name: "script".into(),
                raw
            }
        );
    }

    #[test]
    fn non_object_model_is_kept_raw() {
        let c = Component::decode("model", json!(17));
        assert!(matches!(c, Component::Unknown { ref name, .. } if name == "model"));
    }

    #[test]
    fn light_reads_type_and_shape() {
        let c = Component::decode("light", json!({"type": "Spot", "shape": 2, "color": [1, 0, 0]}));
        match c {
            Component::Light(light) => {
                assert_eq!(light.kind, LightKind::Spot);
                assert_eq!(light.shape, LightShape::Disk);
                assert_eq!(light.color, [1.0, 0.0, 0.0]);
            }
            other => panic!("unexpected component {:?}", other),
        }
    }
}
