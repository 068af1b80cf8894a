use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Load and deep-merge YAML files in order, then canonicalize to JSON and
/// hash. Later files override earlier files; a single-file layer stack is
/// the common case (one base config) but overlay files (e.g. a per-symbol
/// override) are supported by listing them after the base.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let s = fs::read_to_string(p).with_context(|| format!("read config: {p}"))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&s).with_context(|| format!("parse yaml: {p}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonicalize_json(&merged);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Deep-merge: objects merge recursively; arrays and scalars are overwritten
/// wholesale by the later layer.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

/// Sorts object keys recursively so the hash is independent of source key
/// order, then emits compact JSON.
fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Deserializes `T` from `provided`, filling any key `provided` omits with
/// `T::default()`'s value for that key rather than failing. Used for the
/// per-strategy parameter blocks, where an operator typically only tunes a
/// handful of fields and expects the rest to fall back quietly.
pub fn merge_over_default<T>(provided: &Value) -> Result<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Default,
{
    let mut merged = serde_json::to_value(T::default()).context("default serialization failed")?;
    deep_merge(&mut merged, provided.clone());
    serde_json::from_value(merged).context("strategy parameter mapping failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        a: i64,
        b: i64,
    }

    impl Default for Widget {
        fn default() -> Self {
            Widget { a: 1, b: 2 }
        }
    }

    #[test]
    fn merge_over_default_keeps_unspecified_fields() {
        let provided = serde_json::json!({"a": 99});
        let w: Widget = merge_over_default(&provided).unwrap();
        assert_eq!(w, Widget { a: 99, b: 2 });
    }

    #[test]
    fn canonical_hash_is_independent_of_key_order() {
        let a = serde_json::json!({"x": 1, "y": 2});
        let b = serde_json::json!({"y": 2, "x": 1});
        assert_eq!(canonicalize_json(&a), canonicalize_json(&b));
    }
}
