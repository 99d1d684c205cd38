use chrono::{DateTime, Utc};

/// Stable integer identifier the source project assigns to every asset.
/// `0` always means "no reference".
pub type AssetId = u64;

/// Remote folder identifier. `0` is the project root.
pub type FolderId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AssetKind {
    Model,
    Render,
    Material,
    Texture,
    Container,
    Template,
    Folder,
    #[default]
    Unknown,
}

impl AssetKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "model" => AssetKind::Model,
            "render" => AssetKind::Render,
            "material" => AssetKind::Material,
            "texture" => AssetKind::Texture,
            "container" => AssetKind::Container,
            "template" => AssetKind::Template,
            "folder" => AssetKind::Folder,
            _ => AssetKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Model => "model",
            AssetKind::Render => "render",
            AssetKind::Material => "material",
            AssetKind::Texture => "texture",
            AssetKind::Container => "container",
            AssetKind::Template => "template",
            AssetKind::Folder => "folder",
            AssetKind::Unknown => "unknown",
        }
    }

    /// Kinds the importer keeps from the remote listing.
    pub fn is_importable(&self) -> bool {
        matches!(
            self,
            AssetKind::Model
                | AssetKind::Render
                | AssetKind::Material
                | AssetKind::Texture
                | AssetKind::Container
                | AssetKind::Template
        )
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asset as described by the remote project listing.
/// Immutable snapshot for the duration of an import run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteAsset {
    pub id: AssetId,
    pub name: String,
    pub kind: AssetKind,
    pub folder: FolderId,
    pub file_name: Option<String>,
    pub size: u64,
    pub hash: String,
    pub modified_at: Option<DateTime<Utc>>,
    pub url: String,
    /// Binary that actually holds the geometry when this asset is a thin wrapper.
    pub source_id: Option<AssetId>,
}

impl RemoteAsset {
    pub fn has_file(&self) -> bool {
        !self.url.is_empty()
    }

    /// `source_id`, ignoring the `0` placeholder some listings carry.
    pub fn source(&self) -> Option<AssetId> {
        self.source_id.filter(|id| *id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_case_insensitive() {
        assert_eq!(AssetKind::from_tag("Texture"), AssetKind::Texture);
        assert_eq!(AssetKind::from_tag("script"), AssetKind::Unknown);
        assert!(AssetKind::Container.is_importable());
        assert!(!AssetKind::Folder.is_importable());
    }

    #[test]
    fn zero_source_is_no_source() {
        let asset = RemoteAsset {
            source_id: Some(0),
            ..Default::default()
        };
        assert_eq!(asset.source(), None);
    }
}
