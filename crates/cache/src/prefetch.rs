//! Breadth-first walk over a manifest for embedded resources

use crate::keys::{canonicalize, declared_id, ResourceKind};
use serde_json::Value;
use std::collections::VecDeque;

const IDENTITY_FIELDS: [&str; 5] = ["id", "@id", "type", "@type", "label"];

/// A resource found embedded in a manifest
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedResource {
    pub uri: String,
    pub kind: ResourceKind,
    pub value: Value,
}

/// Whether `object` carries content beyond its identity.
///
/// References (`{"id": .., "type": "Canvas"}`) are not worth caching: a later
/// lookup would still have to fetch the full resource.
fn is_substantive(object: &serde_json::Map<String, Value>) -> bool {
    object.keys().any(|k| !IDENTITY_FIELDS.contains(&k.as_str()))
}

/// Collect the resources embedded in `manifest`, nearest first.
///
/// At most `limit` JSON nodes below the root are visited. The root itself is
/// never returned.
pub fn embedded_resources(manifest: &Value, limit: usize) -> Vec<EmbeddedResource> {
    let mut found = Vec::new();
    let mut queue: VecDeque<&Value> = VecDeque::new();
    enqueue_children(manifest, &mut queue);

    let mut visited = 0usize;
    while let Some(node) = queue.pop_front() {
        if visited >= limit {
            break;
        }
        visited += 1;

        if let Value::Object(object) = node {
            if let (Some(id), Some(kind)) = (declared_id(node), ResourceKind::declared_by(node)) {
                if is_substantive(object) {
                    found.push(EmbeddedResource {
                        uri: canonicalize(id),
                        kind,
                        value: node.clone(),
                    });
                }
            }
        }
        enqueue_children(node, &mut queue);
    }
    found
}

fn enqueue_children<'a>(node: &'a Value, queue: &mut VecDeque<&'a Value>) {
    match node {
        Value::Object(object) => queue.extend(object.values().filter(|v| v.is_object() || v.is_array())),
        Value::Array(items) => queue.extend(items.iter().filter(|v| v.is_object() || v.is_array())),
        _ => {}
    }
}
