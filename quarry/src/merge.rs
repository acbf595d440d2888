//! Recursive merge of JSON document trees
//!
//! Objects merge key by key, recursing when both sides hold the same kind of
//! composite value. Arrays are list-style: the overlay's entries are appended,
//! never written over the base's entries at the same position. Anything else
//! is replaced by the overlay value.

use serde_json::{Map, Value};

/// Merge `overlays` into `base`, left to right. Inputs are left untouched.
pub fn merge<'a, I>(base: &Value, overlays: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut acc = base.clone();
    for overlay in overlays {
        merge_into(&mut acc, overlay);
    }
    acc
}

/// Merge a single overlay into `base`
pub fn merge_two(base: &Value, overlay: &Value) -> Value {
    merge(base, std::iter::once(overlay))
}

/// Object-level merge used by the command builder
pub fn merge_maps(base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    let mut acc = Value::Object(base);
    merge_into(&mut acc, &Value::Object(overlay));
    match acc {
        Value::Object(map) => map,
        _ => unreachable!("object merged with object stays an object"),
    }
}

fn merge_into(acc: &mut Value, overlay: &Value) {
    match (acc, overlay) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) if same_composite(existing, value) => merge_into(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            target.extend(source.iter().cloned());
        }
        (acc, overlay) => *acc = overlay.clone(),
    }
}

fn same_composite(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}
