//! Speaker enrichment: attach linked display names to text records.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::{GraphStore, ENTITY_ID_COLUMN};
use crate::models::{Table, NAME_PROPERTY};
use crate::services::expansion::{build_with_demotion, BuildAction};

/// Column holding the list of linked names.
pub const SPEAKERS_COLUMN: &str = "speakers";

const TARGET_ID_COLUMN: &str = "target_id";

/// Adds a [`SPEAKERS_COLUMN`] to `primary` listing, per row, the names of
/// the `related` entities linked through the `junction` table.
///
/// Names keep junction order and nulls are skipped. Rows without links get
/// an empty list. Without the junction table `primary` is returned as-is.
/// `primary` must still carry its `entity_id` column.
pub fn attach_speakers<S: GraphStore + ?Sized>(
    store: &mut S,
    primary: Table,
    junction: &str,
    related: &str,
) -> Result<Table, AppError> {
    if !store.table_exists(junction)? {
        tracing::debug!("No junction table {}; speakers not attached", junction);
        return Ok(primary);
    }
    let Some(key) = primary.column_index(ENTITY_ID_COLUMN) else {
        tracing::warn!("Cannot attach speakers without {}", ENTITY_ID_COLUMN);
        return Ok(primary);
    };

    if !store.table_exists(related)? {
        build_with_demotion(&mut *store, BuildAction::Entity(related))?;
    }
    let names = if store.table_exists(related)? {
        display_names(&store.read_table(related)?)
    } else {
        HashMap::new()
    };

    let links = store.read_table(junction)?;
    let mut speakers: HashMap<String, Vec<JsonValue>> = HashMap::new();
    if let (Some(source_idx), Some(target_idx)) = (
        links.column_index(ENTITY_ID_COLUMN),
        links.column_index(TARGET_ID_COLUMN),
    ) {
        for row in links.rows() {
            let (Some(source), Some(target)) = (row[source_idx].as_str(), row[target_idx].as_str())
            else {
                continue;
            };
            let entry = speakers.entry(source.to_string()).or_default();
            if let Some(name) = names.get(target) {
                entry.push(JsonValue::String(name.clone()));
            }
        }
    }

    let column: Vec<JsonValue> = primary
        .rows()
        .iter()
        .map(|row| {
            let list = row[key]
                .as_str()
                .and_then(|id| speakers.get(id))
                .cloned()
                .unwrap_or_default();
            JsonValue::Array(list)
        })
        .collect();

    let mut enriched = primary;
    enriched.set_column(SPEAKERS_COLUMN, column);
    Ok(enriched)
}

/// Non-null `name` per entity id.
fn display_names(table: &Table) -> HashMap<String, String> {
    let (Some(id), Some(name)) = (
        table.column_index(ENTITY_ID_COLUMN),
        table.column_index(NAME_PROPERTY),
    ) else {
        return HashMap::new();
    };
    table
        .rows()
        .iter()
        .filter_map(|row| {
            let id = row[id].as_str()?;
            let name = row[name].as_str()?;
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::backends::sqlite::{junction_name, SqliteStore};
    use crate::models::{PropertyEdge, TabulatorConfig};
    use serde_json::json;
    use std::collections::BTreeSet;

    /// Store serving prebuilt tables.
    #[derive(Default)]
    struct TableStore {
        tables: HashMap<String, Table>,
        config: TabulatorConfig,
    }

    impl GraphStore for TableStore {
        fn entity_table(&mut self, type_name: &str) -> Result<(), AppError> {
            Err(AppError::UnknownTable(type_name.to_string()))
        }

        fn use_tables(&mut self, type_names: &[String]) -> Result<(), AppError> {
            Err(AppError::AlreadyBuilt(type_names.join(", ")))
        }

        fn fetch_ids(&self, _type_name: &str) -> Result<Vec<String>, AppError> {
            Ok(Vec::new())
        }

        fn fetch_properties(&self, _entity_id: &str) -> Result<Vec<PropertyEdge>, AppError> {
            Ok(Vec::new())
        }

        fn expand_properties(&mut self, _type_name: &str, _properties: &[String]) {}

        fn infer_types(&self) -> Result<BTreeSet<String>, AppError> {
            Ok(BTreeSet::new())
        }

        fn table_exists(&self, name: &str) -> Result<bool, AppError> {
            Ok(self.tables.contains_key(name))
        }

        fn read_table(&self, name: &str) -> Result<Table, AppError> {
            self.tables
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::UnknownTable(name.to_string()))
        }

        fn config(&self) -> &TabulatorConfig {
            &self.config
        }

        fn config_mut(&mut self) -> &mut TabulatorConfig {
            &mut self.config
        }
    }

    fn texts() -> Table {
        Table::from_rows(
            vec!["entity_id".into(), "name".into()],
            vec![
                vec![json!("#t1"), json!("Text 1")],
                vec![json!("#t2"), json!("Text 2")],
                vec![json!("#t3"), json!("Text 3")],
            ],
        )
    }

    fn speaker_store() -> TableStore {
        let mut store = TableStore::default();
        store.tables.insert(
            "RepositoryObject_ldac:speaker".into(),
            Table::from_rows(
                vec!["entity_id".into(), "target_id".into()],
                vec![
                    vec![json!("#t1"), json!("#alice")],
                    vec![json!("#t2"), json!("#bob")],
                ],
            ),
        );
        store.tables.insert(
            "Person".into(),
            Table::from_rows(
                vec!["entity_id".into(), "name".into()],
                vec![
                    vec![json!("#alice"), json!("Alice")],
                    vec![json!("#bob"), json!("Bob")],
                ],
            ),
        );
        store
    }

    #[test]
    fn test_attach_speakers_scenario() {
        let mut store = speaker_store();
        let out =
            attach_speakers(&mut store, texts(), "RepositoryObject_ldac:speaker", "Person")
                .unwrap();

        assert_eq!(out.columns(), ["entity_id", "name", "speakers"]);
        assert_eq!(out.get(0, "speakers"), Some(&json!(["Alice"])));
        assert_eq!(out.get(1, "speakers"), Some(&json!(["Bob"])));
        assert_eq!(out.get(2, "speakers"), Some(&json!([])));
    }

    #[test]
    fn test_absent_junction_is_noop() {
        let mut store = TableStore::default();
        let out = attach_speakers(&mut store, texts(), "RepositoryObject_ldac:speaker", "Person")
            .unwrap();
        assert_eq!(out, texts());
    }

    #[test]
    fn test_null_names_and_unknown_targets_skipped() {
        let mut store = speaker_store();
        store.tables.insert(
            "Person".into(),
            Table::from_rows(
                vec!["entity_id".into(), "name".into()],
                vec![vec![json!("#alice"), JsonValue::Null]],
            ),
        );

        let out = attach_speakers(&mut store, texts(), "RepositoryObject_ldac:speaker", "Person")
            .unwrap();
        assert!(out
            .column_values(SPEAKERS_COLUMN)
            .unwrap()
            .all(|v| v == &json!([])));
    }

    #[test]
    fn test_attach_speakers_from_sqlite_junction() {
        let mut store = SqliteStore::open_in_memory(".").unwrap();
        store
            .load_edges(&[
                PropertyEdge::literal("#t1", "@type", "RepositoryObject"),
                PropertyEdge::link("#t1", "ldac:speaker", "#alice"),
                PropertyEdge::link("#t1", "ldac:speaker", "#bob"),
                PropertyEdge::literal("#t2", "@type", "RepositoryObject"),
                PropertyEdge::link("#t2", "ldac:speaker", "#bob"),
                PropertyEdge::literal("#t3", "@type", "RepositoryObject"),
                PropertyEdge::literal("#alice", "@type", "Person"),
                PropertyEdge::literal("#alice", "name", "Alice"),
                PropertyEdge::literal("#bob", "@type", "Person"),
                PropertyEdge::literal("#bob", "name", "Bob"),
            ])
            .unwrap();
        store.entity_table("RepositoryObject").unwrap();
        let primary = store.read_table("RepositoryObject").unwrap();
        let junction = junction_name("RepositoryObject", "ldac:speaker");

        let out = attach_speakers(&mut store, primary, &junction, "Person").unwrap();
        assert_eq!(out.get(0, "speakers"), Some(&json!(["Alice", "Bob"])));
        assert_eq!(out.get(1, "speakers"), Some(&json!(["Bob"])));
        assert_eq!(out.get(2, "speakers"), Some(&json!([])));
        assert!(store.table_exists("Person").unwrap());
    }
}
