//! Property edges: the unit every entity in the crate graph is stored as.

/// Property label carrying an entity's declared types.
pub const TYPE_PROPERTY: &str = "@type";

/// Property label used as the display value of a linked entity.
pub const NAME_PROPERTY: &str = "name";

/// One `(source, property, value)` triple of the crate graph.
///
/// Multi-valued properties are stored as several edges sharing
/// `source_id` and `label`, in document order. An edge whose value is
/// a link to another entity of the graph carries that entity's id in
/// `target_id`; links to ids the graph does not contain are kept as
/// plain literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEdge {
    /// Id of the entity the property belongs to.
    pub source_id: String,
    /// Property label, e.g. `name` or `ldac:speaker`.
    pub label: String,
    /// Literal value, or the target id for links.
    pub value: Option<String>,
    /// Id of the linked entity, if the value is a link.
    pub target_id: Option<String>,
}

impl PropertyEdge {
    /// Creates a literal-valued edge.
    pub fn literal(source_id: &str, label: &str, value: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            label: label.to_string(),
            value: Some(value.to_string()),
            target_id: None,
        }
    }

    /// Creates an edge linking to another entity.
    pub fn link(source_id: &str, label: &str, target_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            label: label.to_string(),
            value: Some(target_id.to_string()),
            target_id: Some(target_id.to_string()),
        }
    }

    /// Whether this edge declares one of the source's types.
    pub fn is_type(&self) -> bool {
        self.label == TYPE_PROPERTY
    }
}
