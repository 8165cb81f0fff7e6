//! Layer merging
//!
//! Tables merge key by key. Scalars and arrays from the later layer replace
//! the earlier value outright.

use serde_json::Value;

/// Merge `overlay` into `base` in place
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge layers in order; the last layer has the highest precedence
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Object(serde_json::Map::new());
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tables_merge_by_key() {
        let mut base = json!({"signing": {"signer": "Alice", "public_key_hint": "abc"}});
        merge_into(&mut base, json!({"signing": {"public_key_hint": "def"}}));

        assert_eq!(base["signing"]["signer"], "Alice");
        assert_eq!(base["signing"]["public_key_hint"], "def");
    }

    #[test]
    fn test_scalar_and_array_replace() {
        let mut base = json!({"key_size_bits": 2048, "tags": ["a", "b"]});
        merge_into(&mut base, json!({"key_size_bits": 4096, "tags": ["c"]}));

        assert_eq!(base["key_size_bits"], 4096);
        assert_eq!(base["tags"], json!(["c"]));
    }

    #[test]
    fn test_scalar_replaced_by_table() {
        let mut base = json!({"staging": "legacy"});
        merge_into(&mut base, json!({"staging": {"root": "/scratch"}}));
        assert_eq!(base["staging"]["root"], "/scratch");
    }

    #[test]
    fn test_layer_precedence() {
        let merged = merge_layers(vec![
            json!({"key_size_bits": 2048, "signing": {"signer": "builtin"}}),
            json!({"signing": {"signer": "Alice", "public_key_hint": "studio"}}),
            json!({"signing": {"signer": "Bob"}}),
        ]);

        assert_eq!(merged["key_size_bits"], 2048);
        assert_eq!(merged["signing"]["signer"], "Bob");
        assert_eq!(merged["signing"]["public_key_hint"], "studio");
    }

    #[test]
    fn test_no_layers() {
        assert_eq!(merge_layers(Vec::new()), json!({}));
    }
}
