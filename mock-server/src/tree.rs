//! In-memory JSON tree with the database's write semantics.
//!
//! The whole database is one `serde_json::Value`. Writing `null` deletes,
//! and a parent left without children disappears with its last child, so a
//! read never observes an empty object.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Split a slash-delimited path into keys, ignoring empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Node at `path`, if any.
pub fn get<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let node = path.iter().try_fold(root, |node, key| match node {
        Value::Object(map) => map.get(*key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })?;
    (!node.is_null()).then_some(node)
}

/// Replace the node at `path`. Intermediate nodes are created as objects,
/// overwriting any primitive in the way. Empty objects and arrays count as
/// `null`, so writing one deletes.
pub fn set(root: &mut Value, path: &[&str], value: Value) {
    let value = prune(value);
    if value.is_null() {
        remove(root, path);
        return;
    }
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for key in parents {
        node = object_mut(node).entry(key.to_string()).or_insert(Value::Null);
    }
    object_mut(node).insert(last.to_string(), value);
}

/// Apply each `key: value` of `patch` below `path`. Keys may themselves be
/// multi-segment paths; `null` values delete.
pub fn merge(root: &mut Value, path: &[&str], patch: Map<String, Value>) {
    for (key, value) in patch {
        let mut full = path.to_vec();
        full.extend(segments(&key));
        set(root, &full, value);
    }
}

/// Store `value` under a freshly generated child key of `path`; return the key.
pub fn push(root: &mut Value, path: &[&str], value: Value) -> String {
    let key = new_key();
    let mut full = path.to_vec();
    full.push(&key);
    set(root, &full, value);
    key
}

/// Delete the node at `path` and prune parents it leaves empty.
pub fn remove(root: &mut Value, path: &[&str]) {
    let Some((key, rest)) = path.split_first() else {
        *root = Value::Null;
        return;
    };
    if root.is_array() {
        object_mut(root);
    }
    let Value::Object(map) = root else {
        return;
    };
    if rest.is_empty() {
        map.remove(*key);
    } else if let Some(child) = map.get_mut(*key) {
        remove(child, rest);
        if child.is_null() {
            map.remove(*key);
        }
    }
    if map.is_empty() {
        *root = Value::Null;
    }
}

/// Truncate an object's children to `true`. Primitives pass through.
pub fn shallow(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.keys().map(|k| (k.clone(), Value::Bool(true))).collect()),
        Value::Array(items) => Value::Object(
            items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, _)| (i.to_string(), Value::Bool(true)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Drop `null` and empty children; a container left with nothing is `null`.
/// Array elements keep their positions.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().map(prune).collect();
            if items.iter().all(Value::is_null) {
                Value::Null
            } else {
                Value::Array(items)
            }
        }
        other => other,
    }
}

fn new_key() -> String {
    format!("-{}", Uuid::new_v4().simple())
}

/// View `node` as an object, converting arrays to index-keyed objects and
/// discarding anything else.
fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    let map = match node.take() {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    *node = Value::Object(map);
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
