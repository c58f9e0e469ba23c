//! Deep merge of configuration trees.
//!
//! Objects merge key by key, recursively. Every other value (scalars, arrays,
//! `null`, `false`) in the overlay replaces the base value wholesale.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
///
/// Keys keep their position in `base`; keys only present in `overlay` are
/// appended in overlay order.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => deep_merge(slot, value),
                    Some(slot) => *slot = value,
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Non-mutating variant of [`deep_merge`].
pub fn merged(base: &Value, overlay: &Value) -> Value {
    let mut out = base.clone();
    deep_merge(&mut out, overlay.clone());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_merge() {
        let out = merged(&json!({"a": {"x": 1, "y": 2}}), &json!({"a": {"y": 3, "z": 4}}));
        assert_eq!(out, json!({"a": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn test_arrays_replace() {
        let out = merged(&json!({"a": [1, 2]}), &json!({"a": [3]}));
        assert_eq!(out, json!({"a": [3]}));
    }

    #[test]
    fn test_false_replaces_object() {
        let out = merged(&json!({"css": {"entries": "*.css"}}), &json!({"css": false}));
        assert_eq!(out, json!({"css": false}));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let out = merged(&json!({"svg": false}), &json!({"svg": {"entries": "*.svg"}}));
        assert_eq!(out, json!({"svg": {"entries": "*.svg"}}));
    }

    #[test]
    fn test_key_order_preserved() {
        let out = merged(&json!({"b": 1, "a": 2}), &json!({"c": 3, "b": 4}));
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_base_untouched() {
        let base = json!({"a": {"x": 1}});
        let _ = merged(&base, &json!({"a": {"x": 2}}));
        assert_eq!(base, json!({"a": {"x": 1}}));
    }
}
