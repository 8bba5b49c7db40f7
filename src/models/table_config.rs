//! Typed per-table build policy.
//!
//! Mirrors the JSON configuration files:
//!
//! ```json
//! {
//!   "tables": {
//!     "RepositoryObject": {
//!       "properties": [],
//!       "ignore_props": ["hasPart"],
//!       "expand_props": ["author"]
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Table policies keyed by entity type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabulatorConfig {
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
    /// Properties demoted during this session, per table. Never read from
    /// or written to a file.
    #[serde(skip)]
    demoted: BTreeMap<String, BTreeSet<String>>,
}

/// Build policy for one entity table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Properties to keep. Empty keeps every property.
    #[serde(default)]
    pub properties: Vec<String>,
    /// Every property label seen on the type, filled in by the store on build.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub all_props: BTreeSet<String>,
    /// Properties (and their prefixed sub-columns) left out of the table.
    #[serde(default)]
    pub ignore_props: BTreeSet<String>,
    /// Link properties whose targets are merged in as prefixed columns.
    #[serde(default)]
    pub expand_props: BTreeSet<String>,
}

impl TabulatorConfig {
    /// Reads a configuration file.
    ///
    /// A missing file is reported as [`AppError::ConfigNotFound`].
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::ConfigNotFound(path.display().to_string())
            } else {
                AppError::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Returns the policy of a table, if one is defined.
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    /// Returns the policy of a table, creating an empty one if needed.
    pub fn table_mut(&mut self, name: &str) -> &mut TableConfig {
        self.tables.entry(name.to_string()).or_default()
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Ignores `property` on `table` for the rest of the session.
    ///
    /// Returns false if the property was already demoted there.
    pub fn demote(&mut self, table: &str, property: &str) -> bool {
        self.table_mut(table).ignore(property);
        self.demoted
            .entry(table.to_string())
            .or_default()
            .insert(property.to_string())
    }

    /// Overlays `other`: each of its tables replaces the entry of the same
    /// name wholesale, all other entries stay as they are.
    ///
    /// Demotions made earlier in the session survive the replacement, as
    /// does the observed `all_props` when the new entry carries none.
    pub fn merge_tables(&mut self, other: TabulatorConfig) {
        for (name, mut incoming) in other.tables {
            if let Some(previous) = self.tables.remove(&name) {
                if incoming.all_props.is_empty() {
                    incoming.all_props = previous.all_props;
                }
            }
            if let Some(demoted) = self.demoted.get(&name) {
                incoming.ignore_props.extend(demoted.iter().cloned());
            }
            self.tables.insert(name, incoming);
        }
    }
}

impl TableConfig {
    /// True if `column` is an ignored property or one of its sub-columns.
    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore_props
            .iter()
            .any(|prop| column == prop || is_sub_column(column, prop))
    }

    /// True if the base property passes the `properties` filter.
    pub fn is_retained(&self, property: &str) -> bool {
        self.properties.is_empty() || self.properties.iter().any(|p| p == property)
    }

    /// Adds a property to `ignore_props`. Returns false if it was already there.
    pub fn ignore(&mut self, property: &str) -> bool {
        self.ignore_props.insert(property.to_string())
    }

    /// Whether link targets of `property` are merged into the table.
    pub fn is_expanded(&self, property: &str) -> bool {
        self.expand_props.contains(property)
    }
}

fn is_sub_column(column: &str, prop: &str) -> bool {
    column
        .strip_prefix(prop)
        .is_some_and(|rest| rest.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ignore: &[&str]) -> TableConfig {
        TableConfig {
            ignore_props: ignore.iter().map(|s| s.to_string()).collect(),
            ..TableConfig::default()
        }
    }

    #[test]
    fn test_is_ignored_exact_and_prefix() {
        let config = policy(&["publisher_role"]);
        assert!(config.is_ignored("publisher_role"));
        assert!(config.is_ignored("publisher_role_7"));
        assert!(config.is_ignored("publisher_role_id"));
        assert!(!config.is_ignored("publisher_roles"));
        assert!(!config.is_ignored("publisher"));
    }

    #[test]
    fn test_is_retained_empty_keeps_all() {
        let mut config = TableConfig::default();
        assert!(config.is_retained("anything"));
        config.properties = vec!["name".to_string()];
        assert!(config.is_retained("name"));
        assert!(!config.is_retained("description"));
    }

    #[test]
    fn test_merge_tables_replaces_whole_entry() {
        let mut general: TabulatorConfig = serde_json::from_str(
            r#"{"tables": {
                "Person": {"ignore_props": ["birthDate"], "expand_props": ["homeLocation"]},
                "Organization": {"ignore_props": ["url"]}
            }}"#,
        )
        .unwrap();
        let corpus: TabulatorConfig = serde_json::from_str(
            r#"{"tables": {
                "Person": {"ignore_props": ["gender"]},
                "Letter": {"expand_props": ["author"]}
            }}"#,
        )
        .unwrap();

        general.merge_tables(corpus);

        let person = general.table("Person").unwrap();
        assert!(person.ignore_props.contains("gender"));
        assert!(!person.ignore_props.contains("birthDate"));
        assert!(person.expand_props.is_empty());
        assert!(general.table("Organization").unwrap().is_ignored("url"));
        assert!(general.table("Letter").unwrap().is_expanded("author"));
    }

    #[test]
    fn test_merge_keeps_session_demotions() {
        let mut live = TabulatorConfig::default();
        live.table_mut("RepositoryObject")
            .all_props
            .insert("publisher".to_string());
        assert!(live.demote("RepositoryObject", "publisher_role"));
        assert!(!live.demote("RepositoryObject", "publisher_role"));

        let corpus: TabulatorConfig = serde_json::from_str(
            r#"{"tables": {"RepositoryObject": {"ignore_props": ["hasPart"]}}}"#,
        )
        .unwrap();
        live.merge_tables(corpus);

        let policy = live.table("RepositoryObject").unwrap();
        assert!(policy.is_ignored("publisher_role"));
        assert!(policy.is_ignored("hasPart"));
        assert!(policy.all_props.contains("publisher"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TabulatorConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(AppError::ConfigNotFound(_))));
    }

    #[test]
    fn test_ignore_reports_novelty() {
        let mut config = TableConfig::default();
        assert!(config.ignore("author"));
        assert!(!config.ignore("author"));
    }
}
