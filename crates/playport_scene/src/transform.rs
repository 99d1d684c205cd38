use glam::Vec3;
use serde_json::Value;

/// Local transform of an exported entity, in the exporter's own space.
/// Rotation is Euler angles in degrees; no space conversion happens here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_json(
        position: Option<&Value>,
        rotation: Option<&Value>,
        scale: Option<&Value>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            position: read_vec3(position).unwrap_or(defaults.position),
            rotation: read_vec3(rotation).unwrap_or(defaults.rotation),
            scale: read_vec3(scale).unwrap_or(defaults.scale),
        }
    }
}

/// Accepts both `[x, y, z]` and `{ "x": .., "y": .., "z": .. }`.
pub fn read_vec3(value: Option<&Value>) -> Option<Vec3> {
    let component = |v: Option<&Value>| v.and_then(Value::as_f64).map(|f| f as f32);

    match value? {
        Value::Array(items) if items.len() >= 3 => Some(Vec3::new(
            component(items.first())?,
            component(items.get(1))?,
            component(items.get(2))?,
        )),
        Value::Object(map) => Some(Vec3::new(
            component(map.get("x"))?,
            component(map.get("y"))?,
            component(map.get("z"))?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_both_vector_forms() {
        assert_eq!(read_vec3(Some(&json!([1, 2, 3]))), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            read_vec3(Some(&json!({"x": 1.5, "y": 0, "z": -2}))),
            Some(Vec3::new(1.5, 0.0, -2.0))
        );
    }

    #[test]
    fn malformed_vectors_fall_back_to_identity() {
        let t = Transform::from_json(Some(&json!([1, 2])), None, Some(&json!({"x": 2})));
        assert_eq!(t, Transform::default());
    }
}
