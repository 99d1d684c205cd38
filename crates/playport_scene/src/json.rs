//! Lenient accessors over raw JSON payloads.
//!
//! Component payloads come from an external exporter, so a field that is absent,
//! `null` or of the wrong type is an expected outcome, never an error.

use playport_core::AssetId;
use serde_json::Value;

/// Reads a non-negative integer from an integer, an integral float or a numeric string.
/// A present, non-null value that cannot be read is reported and yields `None`.
fn unsigned(value: Option<&Value>) -> Option<u64> {
    let raw = value?;
    let parsed = match raw {
        Value::Null => return None,
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        log::warn!("Ignoring unreadable numeric field {}", raw);
    }
    parsed
}

/// Reads an asset reference. Accepts integers and numeric strings;
/// anything else (absent, null, negative, garbage) is `0`, "no reference".
pub fn asset_id(value: Option<&Value>) -> AssetId {
    unsigned(value).unwrap_or(0)
}

/// Like [`asset_id`] but maps the "no reference" value to `None`.
pub fn opt_asset_id(value: Option<&Value>) -> Option<AssetId> {
    Some(asset_id(value)).filter(|id| *id != 0)
}

pub fn opt_u32(value: Option<&Value>) -> Option<u32> {
    let v = unsigned(value)?;
    let narrowed = u32::try_from(v).ok();
    if narrowed.is_none() {
        log::warn!("Ignoring out-of-range value {}", v);
    }
    narrowed
}

pub fn opt_f32(value: Option<&Value>) -> Option<f32> {
    value.and_then(Value::as_f64).map(|v| v as f32)
}

pub fn opt_bool(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

pub fn opt_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a list of asset references, dropping zero/malformed members.
/// A single scalar is accepted as a one-element list.
pub fn asset_id_list(value: Option<&Value>) -> Vec<AssetId> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| asset_id(Some(item)))
            .filter(|id| *id != 0)
            .collect(),
        Some(scalar @ (Value::Number(_) | Value::String(_))) => {
            Some(asset_id(Some(scalar))).into_iter().filter(|id| *id != 0).collect()
        }
        _ => Vec::new(),
    }
}

/// Reads a colour as `[r, g, b]`, white when malformed.
pub fn color3(value: Option<&Value>) -> [f32; 3] {
    let mut rgb = [1.0; 3];
    if let Some(Value::Array(items)) = value {
        if items.len() >= 3 {
            for (slot, item) in rgb.iter_mut().zip(items) {
                *slot = item.as_f64().unwrap_or(1.0) as f32;
            }
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asset_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(asset_id(Some(&json!(42))), 42);
        assert_eq!(asset_id(Some(&json!("42"))), 42);
        assert_eq!(asset_id(Some(&json!(42.0))), 42);
    }

    #[test]
    fn asset_id_treats_garbage_as_no_reference() {
        assert_eq!(asset_id(None), 0);
        assert_eq!(asset_id(Some(&Value::Null)), 0);
        assert_eq!(asset_id(Some(&json!(-3))), 0);
        assert_eq!(asset_id(Some(&json!("abc"))), 0);
        assert_eq!(asset_id(Some(&json!({"id": 4}))), 0);
        assert_eq!(opt_asset_id(Some(&json!(0))), None);
    }

    #[test]
    fn small_integers_share_asset_id_leniency() {
        assert_eq!(opt_u32(Some(&json!(2))), Some(2));
        assert_eq!(opt_u32(Some(&json!(2.0))), Some(2));
        assert_eq!(opt_u32(Some(&json!(" 3 "))), Some(3));
        assert_eq!(opt_u32(Some(&json!(2.5))), None);
        assert_eq!(opt_u32(Some(&json!(-1))), None);
        assert_eq!(opt_u32(Some(&json!(u64::from(u32::MAX) + 1))), None);
        assert_eq!(opt_u32(Some(&Value::Null)), None);
        assert_eq!(opt_u32(None), None);
    }

    #[test]
    fn id_lists_drop_zero_and_null() {
        let ids = asset_id_list(Some(&json!([10, null, 0, "11", "x"])));
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(asset_id_list(Some(&json!(7))), vec![7]);
        assert!(asset_id_list(Some(&json!("nope"))).is_empty());
    }
}
