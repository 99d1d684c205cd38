use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    components::{Component, ModelComponent, RenderComponent},
    json,
    transform::Transform,
};

/// A node of the exported scene tree. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawEntity")]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub transform: Transform,
    pub components: BTreeMap<String, Component>,
    pub children: Vec<Entity>,
}

// Wire shape. Every field is optional so a sloppy export never fails the
// whole document.
#[derive(Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    rotation: Option<Value>,
    #[serde(default)]
    scale: Option<Value>,
    #[serde(default)]
    components: Option<Value>,
    #[serde(default)]
    children: Option<Value>,
}

impl From<RawEntity> for Entity {
    fn from(raw: RawEntity) -> Self {
        let id = json::opt_string(raw.id.as_ref()).unwrap_or_default();
        let name = json::opt_string(raw.name.as_ref()).unwrap_or_default();

        let mut components = BTreeMap::new();
        if let Some(Value::Object(map)) = raw.components {
            for (key, payload) in map {
                let component = Component::decode(&key, payload);
                components.insert(key, component);
            }
        }

        let mut children = Vec::new();
        if let Some(Value::Array(items)) = raw.children {
            for item in items {
                if item.is_null() {
                    continue;
                }
                match serde_json::from_value::<Entity>(item) {
                    Ok(child) => children.push(child),
                    Err(e) => log::warn!("Skipping malformed child of entity '{}': {}", id, e),
                }
            }
        }

        Self {
            transform: Transform::from_json(
                raw.position.as_ref(),
                raw.rotation.as_ref(),
                raw.scale.as_ref(),
            ),
            id,
            name,
            components,
            children,
        }
    }
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transform: Transform::default(),
            components: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_component(mut self, name: &str, raw: Value) -> Self {
        self.components
            .insert(name.to_string(), Component::decode(name, raw));
        self
    }

    pub fn with_child(mut self, child: Entity) -> Self {
        self.children.push(child);
        self
    }

    /// Falls back to the ID when the entity is unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn model(&self) -> Option<&ModelComponent> {
        match self.components.get("model") {
            Some(Component::Model(model)) => Some(model),
            _ => None,
        }
    }

    pub fn render(&self) -> Option<&RenderComponent> {
        match self.components.get("render") {
            Some(Component::Render(render)) => Some(render),
            _ => None,
        }
    }

    /// Depth-first, pre-order walk. `path` is the `/`-joined chain of names
    /// from the root down to (and including) the visited entity.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Entity, &str),
    {
        self.walk_from("", visit);
    }

    fn walk_from<F>(&self, parent_path: &str, visit: &mut F)
    where
        F: FnMut(&Entity, &str),
    {
        let path = if parent_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", parent_path, self.name)
        };

        visit(self, &path);

        for child in &self.children {
            child.walk_from(&path, visit);
        }
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Entity::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use serde_json::json;

    #[test]
    fn deserializes_nested_tree() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "root-guid",
            "name": "Root",
            "position": {"x": 1, "y": 2, "z": 3},
            "scale": [2, 2, 2],
            "components": {"model": {"asset": 12}},
            "children": [
                {"id": "a", "name": "A", "children": []},
                null,
                "garbage",
                {"id": 7, "name": "B"}
            ]
        }))
        .unwrap();

        assert_eq!(entity.id, "root-guid");
        assert_eq!(entity.transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(entity.transform.rotation, Vec3::ZERO);
        assert_eq!(entity.transform.scale, Vec3::splat(2.0));
        assert_eq!(entity.model().map(|m| m.asset), Some(12));
        assert_eq!(entity.children.len(), 2);
        assert_eq!(entity.children[1].id, "7");
    }

    #[test]
    fn walk_builds_paths_pre_order() {
        let tree = Entity::new("r", "Root")
            .with_child(Entity::new("a", "A").with_child(Entity::new("c", "C")))
            .with_child(Entity::new("b", "B"));

        let mut seen = Vec::new();
        tree.walk(&mut |entity, path| seen.push((entity.id.clone(), path.to_string())));

        assert_eq!(
            seen,
            vec![
                ("r".to_string(), "Root".to_string()),
                ("a".to_string(), "Root/A".to_string()),
                ("c".to_string(), "Root/A/C".to_string()),
                ("b".to_string(), "Root/B".to_string()),
            ]
        );
        assert_eq!(tree.count(), 4);
    }
}
