//! Deep merge of untyped configuration trees.
//!
//! Layers are merged lowest-priority first, one [`deep_merge`] call per
//! layer. Maps merge key-wise and recurse; every other pairing (scalars,
//! lists, mismatched kinds) replaces the base value wholesale. Lists are
//! never concatenated or merged index-wise.

use serde_json::Value;

/// Merge `overlay` onto `base`, returning a new tree.
///
/// Neither input is mutated. For each key in `overlay`: if both sides hold
/// maps, recurse; otherwise the overlay value wins. Keys present only in
/// `base` are retained unchanged.
///
/// Total over any two trees; there are no error conditions.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let entry = match base_map.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

/// Merge an ordered slice of layers, lowest priority first.
///
/// Equivalent to folding [`deep_merge`] left-to-right; an empty slice
/// yields an empty map.
pub fn merge_layers(layers: &[Value]) -> Value {
    let mut merged = Value::Object(serde_json::Map::new());
    for layer in layers {
        merged = deep_merge(&merged, layer);
    }
    merged
}
