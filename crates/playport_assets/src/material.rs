/// Reference to an image inside a container: its name, or URI when it has none.
pub type TextureRef = String;

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSettings {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            roughness: 0.5,
            metallic: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub settings: MaterialSettings,
    pub diffuse_texture: Option<TextureRef>,
    pub normal_texture: Option<TextureRef>,
    pub metallic_roughness_texture: Option<TextureRef>,
    pub occlusion_texture: Option<TextureRef>,
}

impl MaterialData {
    /// Substituted when a plain model carries no material at all.
    pub fn fallback() -> Self {
        Self {
            name: "Default".to_string(),
            ..Default::default()
        }
    }
}
