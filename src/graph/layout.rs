//! Column layout of an entity table.
//!
//! Given the entities of one type and the table's policy, decides which
//! columns exist and what each row holds:
//!
//! - `entity_id` first;
//! - the first value of property `p` in column `p`, further values in
//!   `p_1`, `p_2`, ...;
//! - a link additionally writes the target id to `{column}_id`, while
//!   `{column}` holds the target's `name` (or its id when it has none);
//! - expanded properties merge the target's own properties as
//!   `{column}_{targetProperty}`, one level deep;
//! - the text property's file reference is replaced by the file contents.
//!
//! Link properties that hold more than one target on some entity are also
//! reported as junction pairs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{AppError, OverflowKind};
use crate::models::{PropertyEdge, TableConfig, NAME_PROPERTY};

/// Name of the key column of every entity table.
pub const ENTITY_ID_COLUMN: &str = "entity_id";

/// Bounds past which a layout fails with [`AppError::CardinalityOverflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutLimits {
    /// Column limit, key column included.
    pub max_columns: usize,
    /// Highest suffix index a multi-valued property may use.
    pub max_values: usize,
}

impl Default for LayoutLimits {
    fn default() -> Self {
        Self {
            max_columns: 2000,
            max_values: 100,
        }
    }
}

/// The computed shape and content of one entity table.
#[derive(Debug, Clone, Default)]
pub struct TableLayout {
    pub columns: Vec<String>,
    /// One cell per column for every row.
    pub rows: Vec<Vec<Option<String>>>,
    /// `(entity_id, target_id)` pairs keyed by property label, only for
    /// properties with more than one target on some entity.
    pub junctions: BTreeMap<String, Vec<(String, String)>>,
    /// Every property label seen on the entities.
    pub all_props: BTreeSet<String>,
}

/// Where layout reads the graph from.
pub trait EdgeSource {
    /// Outgoing edges of an entity, in document order.
    fn edges(&self, entity_id: &str) -> Result<Vec<PropertyEdge>, AppError>;

    /// Contents of the crate file a text property refers to.
    fn text(&self, reference: &str) -> Option<String>;
}

/// Lays out the table `table` for the entities `ids`.
pub fn lay_out<S: EdgeSource + ?Sized>(
    table: &str,
    ids: &[String],
    policy: &TableConfig,
    limits: LayoutLimits,
    text_prop: Option<&str>,
    source: &S,
) -> Result<TableLayout, AppError> {
    let mut builder = LayoutBuilder {
        table,
        policy,
        limits,
        text_prop,
        source,
        columns: Columns::new(limits.max_columns),
        targets: HashMap::new(),
    };
    builder.run(ids)
}

struct LayoutBuilder<'a, S: EdgeSource + ?Sized> {
    table: &'a str,
    policy: &'a TableConfig,
    limits: LayoutLimits,
    text_prop: Option<&'a str>,
    source: &'a S,
    columns: Columns,
    targets: HashMap<String, Vec<PropertyEdge>>,
}

impl<S: EdgeSource + ?Sized> LayoutBuilder<'_, S> {
    fn run(&mut self, ids: &[String]) -> Result<TableLayout, AppError> {
        let mut rows = Vec::with_capacity(ids.len());
        let mut all_props = BTreeSet::new();
        let mut links: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        let mut multi_valued = BTreeSet::new();

        for id in ids {
            let mut row = Vec::new();
            self.put(&mut row, ENTITY_ID_COLUMN, Some(id.clone()))?;

            let mut counts: HashMap<String, usize> = HashMap::new();
            let mut link_counts: HashMap<String, usize> = HashMap::new();

            for edge in self.source.edges(id)? {
                all_props.insert(edge.label.clone());
                if !self.policy.is_retained(&edge.label) {
                    continue;
                }

                let index = bump(&mut counts, &edge.label);
                let column = indexed(&edge.label, index);
                if self.policy.is_ignored(&column) {
                    continue;
                }
                if index > self.limits.max_values {
                    return Err(self.overflow(&column, OverflowKind::Values));
                }

                let Some(target) = edge.target_id.as_deref() else {
                    let value = self.literal_value(&edge);
                    self.put(&mut row, &column, value)?;
                    continue;
                };

                let target_edges = self.target_edges(target)?;
                let display = self
                    .text_of(&edge.label, target)
                    .or_else(|| display_name(&target_edges))
                    .unwrap_or_else(|| target.to_string());
                self.put(&mut row, &column, Some(display))?;

                let id_column = format!("{column}_id");
                if !self.policy.is_ignored(&id_column) {
                    self.put(&mut row, &id_column, Some(target.to_string()))?;
                }

                links
                    .entry(edge.label.clone())
                    .or_default()
                    .push((id.clone(), target.to_string()));
                if bump(&mut link_counts, &edge.label) > 0 {
                    multi_valued.insert(edge.label.clone());
                }

                if self.policy.is_expanded(&edge.label) {
                    self.merge_target(&mut row, &column, &target_edges)?;
                }
            }

            rows.push(row);
        }

        let width = self.columns.len();
        for row in &mut rows {
            row.resize(width, None);
        }

        links.retain(|label, _| multi_valued.contains(label));

        Ok(TableLayout {
            columns: self.columns.names.clone(),
            rows,
            junctions: links,
            all_props,
        })
    }

    fn merge_target(
        &mut self,
        row: &mut Vec<Option<String>>,
        column: &str,
        target_edges: &[PropertyEdge],
    ) -> Result<(), AppError> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for sub in target_edges {
            let index = bump(&mut counts, &sub.label);
            let sub_column = indexed(&format!("{column}_{}", sub.label), index);
            if self.policy.is_ignored(&sub_column) {
                continue;
            }
            if index > self.limits.max_values {
                return Err(self.overflow(&sub_column, OverflowKind::Values));
            }

            self.put(row, &sub_column, sub.value.clone())?;
            if let Some(target) = &sub.target_id {
                let id_column = format!("{sub_column}_id");
                if !self.policy.is_ignored(&id_column) {
                    self.put(row, &id_column, Some(target.clone()))?;
                }
            }
        }
        Ok(())
    }

    fn literal_value(&self, edge: &PropertyEdge) -> Option<String> {
        match edge.value.as_deref() {
            Some(reference) => self
                .text_of(&edge.label, reference)
                .or_else(|| edge.value.clone()),
            None => None,
        }
    }

    fn text_of(&self, label: &str, reference: &str) -> Option<String> {
        if self.text_prop == Some(label) {
            self.source.text(reference)
        } else {
            None
        }
    }

    fn target_edges(&mut self, target: &str) -> Result<Vec<PropertyEdge>, AppError> {
        if let Some(edges) = self.targets.get(target) {
            return Ok(edges.clone());
        }
        let edges = self.source.edges(target)?;
        self.targets.insert(target.to_string(), edges.clone());
        Ok(edges)
    }

    fn put(
        &mut self,
        row: &mut Vec<Option<String>>,
        column: &str,
        value: Option<String>,
    ) -> Result<(), AppError> {
        let idx = match self.columns.slot(column) {
            Some(idx) => idx,
            None => return Err(self.overflow(column, OverflowKind::Columns)),
        };
        if row.len() <= idx {
            row.resize(idx + 1, None);
        }
        row[idx] = value;
        Ok(())
    }

    fn overflow(&self, column: &str, kind: OverflowKind) -> AppError {
        AppError::CardinalityOverflow {
            table: self.table.to_string(),
            column: column.strip_suffix("_id").unwrap_or(column).to_string(),
            kind,
        }
    }
}

/// Ordered column registry with a size limit.
struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
    max: usize,
}

impl Columns {
    fn new(max: usize) -> Self {
        Self {
            names: Vec::new(),
            index: HashMap::new(),
            max,
        }
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    /// Position of `name`, registering it if new. `None` when full.
    fn slot(&mut self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(name) {
            return Some(idx);
        }
        if self.names.len() >= self.max {
            return None;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        Some(idx)
    }
}

fn bump(counts: &mut HashMap<String, usize>, label: &str) -> usize {
    let count = counts.entry(label.to_string()).or_insert(0);
    let index = *count;
    *count += 1;
    index
}

fn indexed(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}_{index}")
    }
}

fn display_name(edges: &[PropertyEdge]) -> Option<String> {
    edges
        .iter()
        .find(|e| e.label == NAME_PROPERTY)
        .and_then(|e| e.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapSource {
        edges: Vec<PropertyEdge>,
        files: HashMap<String, String>,
    }

    impl MapSource {
        fn new(edges: Vec<PropertyEdge>) -> Self {
            Self {
                edges,
                files: HashMap::new(),
            }
        }
    }

    impl EdgeSource for MapSource {
        fn edges(&self, entity_id: &str) -> Result<Vec<PropertyEdge>, AppError> {
            Ok(self
                .edges
                .iter()
                .filter(|e| e.source_id == entity_id)
                .cloned()
                .collect())
        }

        fn text(&self, reference: &str) -> Option<String> {
            self.files.get(reference).cloned()
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cell<'a>(layout: &'a TableLayout, row: usize, column: &str) -> Option<&'a str> {
        let idx = layout.columns.iter().position(|c| c == column)?;
        layout.rows[row][idx].as_deref()
    }

    fn letter_graph() -> Vec<PropertyEdge> {
        vec![
            PropertyEdge::literal("#l1", "@type", "RepositoryObject"),
            PropertyEdge::literal("#l1", "name", "Letter 1"),
            PropertyEdge::link("#l1", "author", "#alice"),
            PropertyEdge::literal("#l1", "keywords", "travel"),
            PropertyEdge::literal("#l1", "keywords", "family"),
            PropertyEdge::link("#l1", "recipient", "#bob"),
            PropertyEdge::link("#l1", "recipient", "#carol"),
            PropertyEdge::literal("#alice", "@type", "Person"),
            PropertyEdge::literal("#alice", "name", "Alice"),
            PropertyEdge::literal("#alice", "description", "Convict"),
            PropertyEdge::literal("#bob", "@type", "Person"),
            PropertyEdge::literal("#bob", "name", "Bob"),
            PropertyEdge::literal("#carol", "@type", "Person"),
        ]
    }

    #[test]
    fn test_multi_valued_and_link_columns() {
        let source = MapSource::new(letter_graph());
        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &TableConfig::default(),
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert_eq!(layout.columns[0], ENTITY_ID_COLUMN);
        assert_eq!(cell(&layout, 0, "keywords"), Some("travel"));
        assert_eq!(cell(&layout, 0, "keywords_1"), Some("family"));
        assert_eq!(cell(&layout, 0, "author"), Some("Alice"));
        assert_eq!(cell(&layout, 0, "author_id"), Some("#alice"));
        assert_eq!(cell(&layout, 0, "recipient_1"), Some("#carol"));
        assert_eq!(cell(&layout, 0, "recipient_1_id"), Some("#carol"));
        assert!(layout.all_props.contains("keywords"));
    }

    #[test]
    fn test_junctions_only_for_multi_target_properties() {
        let source = MapSource::new(letter_graph());
        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &TableConfig::default(),
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert!(!layout.junctions.contains_key("author"));
        assert_eq!(
            layout.junctions["recipient"],
            vec![
                ("#l1".to_string(), "#bob".to_string()),
                ("#l1".to_string(), "#carol".to_string())
            ]
        );
    }

    #[test]
    fn test_expansion_merges_prefixed_columns() {
        let source = MapSource::new(letter_graph());
        let mut policy = TableConfig::default();
        policy.expand_props.insert("author".to_string());

        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &policy,
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert_eq!(cell(&layout, 0, "author_name"), Some("Alice"));
        assert_eq!(cell(&layout, 0, "author_description"), Some("Convict"));
        assert_eq!(cell(&layout, 0, "author_@type"), Some("Person"));
        assert!(!layout.columns.iter().any(|c| c.starts_with("recipient_name")));
    }

    #[test]
    fn test_ignore_props_drops_column_and_sub_columns() {
        let source = MapSource::new(letter_graph());
        let mut policy = TableConfig::default();
        policy.ignore("recipient");
        policy.ignore("keywords");

        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &policy,
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert!(!layout
            .columns
            .iter()
            .any(|c| c.starts_with("recipient") || c.starts_with("keywords")));
        assert!(layout.junctions.is_empty());
        assert!(layout.all_props.contains("recipient"));
    }

    #[test]
    fn test_properties_filter_keeps_listed_only() {
        let source = MapSource::new(letter_graph());
        let policy = TableConfig {
            properties: vec!["name".to_string()],
            ..TableConfig::default()
        };

        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &policy,
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert_eq!(layout.columns, vec!["entity_id", "name"]);
    }

    #[test]
    fn test_sub_property_value_overflow_names_column() {
        let mut edges = vec![
            PropertyEdge::literal("#l1", "@type", "RepositoryObject"),
            PropertyEdge::link("#l1", "publisher", "#press"),
            PropertyEdge::literal("#press", "@type", "Organization"),
        ];
        for i in 0..10 {
            edges.push(PropertyEdge::literal("#press", "role", &format!("role {i}")));
        }
        let source = MapSource::new(edges);
        let mut policy = TableConfig::default();
        policy.expand_props.insert("publisher".to_string());
        let limits = LayoutLimits {
            max_columns: 2000,
            max_values: 6,
        };

        let err = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &policy,
            limits,
            None,
            &source,
        )
        .unwrap_err();

        match err {
            AppError::CardinalityOverflow { table, column, kind } => {
                assert_eq!(table, "RepositoryObject");
                assert_eq!(column, "publisher_role_7");
                assert_eq!(kind, OverflowKind::Values);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_limit_overflow() {
        let source = MapSource::new(letter_graph());
        let limits = LayoutLimits {
            max_columns: 3,
            max_values: 100,
        };

        let err = lay_out(
            "RepositoryObject",
            &ids(&["#l1"]),
            &TableConfig::default(),
            limits,
            None,
            &source,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::CardinalityOverflow {
                kind: OverflowKind::Columns,
                ..
            }
        ));
    }

    #[test]
    fn test_text_property_loads_file_contents() {
        let mut source = MapSource::new(vec![
            PropertyEdge::literal("#l1", "@type", "RepositoryObject"),
            PropertyEdge::link("#l1", "ldac:mainText", "data/l1.txt"),
            PropertyEdge::literal("data/l1.txt", "@type", "File"),
            PropertyEdge::literal("#l2", "@type", "RepositoryObject"),
            PropertyEdge::literal("#l2", "ldac:mainText", "data/missing.txt"),
        ]);
        source
            .files
            .insert("data/l1.txt".to_string(), "Dear sir".to_string());

        let layout = lay_out(
            "RepositoryObject",
            &ids(&["#l1", "#l2"]),
            &TableConfig::default(),
            LayoutLimits::default(),
            Some("ldac:mainText"),
            &source,
        )
        .unwrap();

        assert_eq!(cell(&layout, 0, "ldac:mainText"), Some("Dear sir"));
        assert_eq!(cell(&layout, 0, "ldac:mainText_id"), Some("data/l1.txt"));
        assert_eq!(cell(&layout, 1, "ldac:mainText"), Some("data/missing.txt"));
    }

    #[test]
    fn test_rows_padded_to_width() {
        let source = MapSource::new(vec![
            PropertyEdge::literal("#a", "@type", "Person"),
            PropertyEdge::literal("#b", "@type", "Person"),
            PropertyEdge::literal("#b", "name", "Bob"),
        ]);

        let layout = lay_out(
            "Person",
            &ids(&["#a", "#b"]),
            &TableConfig::default(),
            LayoutLimits::default(),
            None,
            &source,
        )
        .unwrap();

        assert!(layout.rows.iter().all(|r| r.len() == layout.columns.len()));
        assert_eq!(cell(&layout, 0, "name"), None);
    }
}
