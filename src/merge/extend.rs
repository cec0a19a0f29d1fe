//! Extend-only merging: external data may add structure but never replace
//! a value the baseline already holds.

use log::trace;
use serde_json::{Map, Value};

use super::{index_path, key_path};

pub(super) fn merge(base: &Value, external: &Value, path: &str) -> Value {
    match (base, external) {
        (Value::Object(base_map), Value::Object(ext_map)) => {
            let mut result: Map<String, Value> = base_map.clone();
            for (key, ext_value) in ext_map {
                let child = key_path(path, key);
                let merged = match base_map.get(key) {
                    Some(base_value) => merge(base_value, ext_value, &child),
                    None => {
                        trace!("[EXTEND] {child}: added from external");
                        ext_value.clone()
                    }
                };
                result.insert(key.clone(), merged);
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
            for (i, ext_value) in ext_items.iter().enumerate().skip(base_items.len()) {
                trace!("[EXTEND] {}: appended from external", index_path(path, i));
                result.push(ext_value.clone());
            }
            Value::Array(result)
        }
        _ => base.clone(),
    }
}
