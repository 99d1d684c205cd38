use crate::{
    components::{Component, LightKind, LightShape, RenderComponent},
    entity::Entity,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub total_nodes: usize,
    /// Nodes with a model component or an asset-backed render component.
    pub mesh_nodes: usize,
    pub total_lights: usize,
    pub point_lights: usize,
    pub spot_lights: usize,
    pub directional_lights: usize,
    pub punctual_lights: usize,
    pub rectangle_lights: usize,
    pub disk_lights: usize,
    pub sphere_lights: usize,
}

impl SceneStatistics {
    pub fn collect(root: &Entity) -> Self {
        let mut stats = Self::default();
        root.walk(&mut |entity, _| stats.visit(entity));
        stats
    }

    fn visit(&mut self, entity: &Entity) {
        self.total_nodes += 1;

        let has_model = entity.model().is_some_and(|m| m.asset != 0);
        let has_render_asset =
            matches!(entity.render(), Some(RenderComponent::Asset { asset, .. }) if *asset != 0);
        if has_model || has_render_asset {
            self.mesh_nodes += 1;
        }

        if let Some(Component::Light(light)) = entity.component("light") {
            self.total_lights += 1;

            match light.kind {
                LightKind::Point => self.point_lights += 1,
                LightKind::Spot => self.spot_lights += 1,
                LightKind::Directional => self.directional_lights += 1,
                LightKind::Other => {}
            }

            match light.shape {
                LightShape::Punctual => self.punctual_lights += 1,
                LightShape::Rectangle => self.rectangle_lights += 1,
                LightShape::Disk => self.disk_lights += 1,
                LightShape::Sphere => self.sphere_lights += 1,
            }
        }
    }

    /// Lights that need an area-light atlas slot downstream.
    pub fn area_lights(&self) -> usize {
        self.rectangle_lights + self.disk_lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_nodes_meshes_and_lights() {
        let tree = Entity::new("r", "Root")
            .with_child(Entity::new("m", "Crate").with_component("model", json!({"asset": 3})))
            .with_child(
                Entity::new("p", "Floor").with_component("render", json!({"type": "plane"})),
            )
            .with_child(
                Entity::new("l", "Lamp")
                    .with_component("light", json!({"type": "omni", "shape": 1})),
            )
            .with_child(
                Entity::new("s", "Sun").with_component("light", json!({"type": "directional"})),
            );

        let stats = SceneStatistics::collect(&tree);
        assert_eq!(stats.total_nodes, 5);
        assert_eq!(stats.mesh_nodes, 1);
        assert_eq!(stats.total_lights, 2);
        assert_eq!(stats.point_lights, 1);
        assert_eq!(stats.directional_lights, 1);
        assert_eq!(stats.area_lights(), 1);
    }

    #[test]
    fn zero_asset_components_are_not_meshes() {
        let tree = Entity::new("r", "Root")
            .with_child(Entity::new("a", "Empty").with_component("model", json!({"asset": 0})))
            .with_child(
                Entity::new("b", "Blank")
                    .with_component("render", json!({"type": "asset", "asset": 0})),
            )
            .with_child(Entity::new("c", "Crate").with_component("model", json!({"asset": 3})));

        let stats = SceneStatistics::collect(&tree);
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.mesh_nodes, 1);
    }
}
