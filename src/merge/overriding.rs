//! Override-only merging: external data replaces values the baseline
//! already holds and never adds keys or indices of its own.

use log::trace;
use serde_json::{Map, Value};

use super::{OverrideMissing, index_path, key_path, trace_leaf};

pub(super) fn merge(base: &Value, external: &Value, missing: OverrideMissing, path: &str) -> Value {
    match (base, external) {
        (Value::Object(base_map), Value::Object(ext_map)) => {
            let result: Map<String, Value> = base_map
                .iter()
                .map(|(key, base_value)| {
                    let child = key_path(path, key);
                    let value = match ext_map.get(key) {
                        Some(ext_value) => merge(base_value, ext_value, missing, &child),
                        None => fill_missing(base_value, missing, &child),
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(result)
        }
        (Value::Array(base_items), Value::Array(ext_items)) => Value::Array(
            base_items
                .iter()
                .enumerate()
                .map(|(i, base_value)| {
                    let child = index_path(path, i);
                    match ext_items.get(i) {
                        Some(ext_value) => merge(base_value, ext_value, missing, &child),
                        None => fill_missing(base_value, missing, &child),
                    }
                })
                .collect(),
        ),
        (Value::Object(_) | Value::Array(_), _) => {
            trace!("[REPLACE ALL] {path}: entire structure replaced");
            external.clone()
        }
        _ => {
            trace_leaf("OVERRIDE", path, base, external);
            external.clone()
        }
    }
}

fn fill_missing(base_value: &Value, missing: OverrideMissing, path: &str) -> Value {
    match missing {
        OverrideMissing::SetMissingToNil => {
            trace!("[OVERRIDE] {path} -> null (missing in external)");
            Value::Null
        }
        OverrideMissing::KeepMissingOriginal => {
            trace!("[KEEP] {path}: kept original (missing in external)");
            base_value.clone()
        }
    }
}
