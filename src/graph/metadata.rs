//! Reading an RO-Crate metadata document into property edges.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::PropertyEdge;

/// File name of the crate's JSON-LD metadata document.
pub const METADATA_FILE: &str = "ro-crate-metadata.json";

/// Finds the metadata document in an extracted crate.
///
/// Looks at the top level first, then one folder down (archives that were
/// not zipped from inside their root folder).
pub fn locate_metadata(crate_dir: &Path) -> Result<PathBuf, AppError> {
    let direct = crate_dir.join(METADATA_FILE);
    if direct.is_file() {
        return Ok(direct);
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(crate_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    entries.sort();

    entries
        .into_iter()
        .map(|dir| dir.join(METADATA_FILE))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| AppError::MetadataNotFound(crate_dir.display().to_string()))
}

/// Reads and flattens the metadata document at `path`.
pub fn read_edges(path: &Path) -> Result<Vec<PropertyEdge>, AppError> {
    let text = fs::read_to_string(path)?;
    let document: JsonValue = serde_json::from_str(&text)?;
    edges_from_document(&document)
}

/// Flattens the `@graph` of a JSON-LD document into property edges.
///
/// Arrays become one edge per item, in document order. `{"@id": ..}` values
/// become links when the id is an entity of the graph and literals
/// otherwise. `{"@value": ..}` objects are unwrapped; any other nested
/// object is kept as its JSON text.
pub fn edges_from_document(document: &JsonValue) -> Result<Vec<PropertyEdge>, AppError> {
    let graph = document
        .get("@graph")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| AppError::InvalidMetadata("missing @graph array".to_string()))?;

    let mut nodes = Vec::with_capacity(graph.len());
    for node in graph {
        let object = node
            .as_object()
            .ok_or_else(|| AppError::InvalidMetadata("@graph entry is not an object".to_string()))?;
        let id = object
            .get("@id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| AppError::InvalidMetadata("@graph entry without @id".to_string()))?;
        nodes.push((id, object));
    }

    let known: HashSet<&str> = nodes.iter().map(|(id, _)| *id).collect();

    let mut edges = Vec::new();
    for (id, object) in nodes {
        flatten_node(id, object, &known, &mut edges);
    }
    Ok(edges)
}

fn flatten_node(
    id: &str,
    object: &Map<String, JsonValue>,
    known: &HashSet<&str>,
    edges: &mut Vec<PropertyEdge>,
) {
    for (label, value) in object {
        if label == "@id" {
            continue;
        }
        match value {
            JsonValue::Array(items) => {
                for item in items {
                    push_value(id, label, item, known, edges);
                }
            }
            single => push_value(id, label, single, known, edges),
        }
    }
}

fn push_value(
    id: &str,
    label: &str,
    value: &JsonValue,
    known: &HashSet<&str>,
    edges: &mut Vec<PropertyEdge>,
) {
    let edge = match value {
        JsonValue::Null => return,
        JsonValue::String(s) => PropertyEdge::literal(id, label, s),
        JsonValue::Number(n) => PropertyEdge::literal(id, label, &n.to_string()),
        JsonValue::Bool(b) => PropertyEdge::literal(id, label, &b.to_string()),
        JsonValue::Object(inner) => {
            if let Some(target) = inner.get("@id").and_then(JsonValue::as_str) {
                if known.contains(target) {
                    PropertyEdge::link(id, label, target)
                } else {
                    PropertyEdge::literal(id, label, target)
                }
            } else if let Some(literal) = inner.get("@value") {
                match literal {
                    JsonValue::String(s) => PropertyEdge::literal(id, label, s),
                    JsonValue::Null => return,
                    other => PropertyEdge::literal(id, label, &other.to_string()),
                }
            } else {
                PropertyEdge::literal(id, label, &value.to_string())
            }
        }
        JsonValue::Array(_) => PropertyEdge::literal(id, label, &value.to_string()),
    };
    edges.push(edge);
}
