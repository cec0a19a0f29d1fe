//! Union merging: override what both sides hold, keep what only the
//! baseline holds, then add what only the external value holds.

use log::trace;
use serde_json::{Map, Value};

use super::{index_path, key_path, trace_leaf};

pub(super) fn merge(base: &Value, external: &Value, path: &str) -> Value {
    match (base, external) {
        (Value::Object(base_map), Value::Object(ext_map)) => {
            let mut result: Map<String, Value> = base_map
                .iter()
                .map(|(key, base_value)| {
                    let child = key_path(path, key);
                    let value = match ext_map.get(key) {
                        Some(ext_value) => merge(base_value, ext_value, &child),
                        None => {
                            trace!("[UNION KEEP] {child}: kept original");
                            base_value.clone()
                        }
                    };
                    (key.clone(), value)
                })
                .collect();
            for (key, ext_value) in ext_map {
                if !result.contains_key(key) {
                    trace!("[UNION EXTEND] {}: added new field", key_path(path, key));
                    result.insert(key.clone(), ext_value.clone());
                }
            }
            Value::Object(result)
        }
        (Value::Array(base_items), Value::Array(ext_items)) => {
            let mut result: Vec<Value> = base_items
                .iter()
                .enumerate()
                .map(|(i, base_value)| match ext_items.get(i) {
                    Some(ext_value) => merge(base_value, ext_value, &index_path(path, i)),
                    None => base_value.clone(),
                })
                .collect();
            result.extend(ext_items.iter().skip(base_items.len()).cloned());
            Value::Array(result)
        }
        (Value::Object(_) | Value::Array(_), _) => {
            trace!("[UNION REPLACE] {path}: entire structure replaced");
            external.clone()
        }
        _ => {
            trace_leaf("UNION", path, base, external);
            external.clone()
        }
    }
}
