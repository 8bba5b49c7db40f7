//! SQLite backend for the crate graph.
//!
//! Every property edge of the crate lives in the `_property` table. Entity
//! tables are projections of it, rebuilt on demand with the current table
//! policy; junction tables created for a type are tracked in `_junction` so
//! a rebuild can drop them first.
//!
//! # Example
//!
//! ```ignore
//! use ldaca_tabulator::graph::backends::sqlite::SqliteStore;
//! use ldaca_tabulator::graph::GraphStore;
//!
//! let mut store = SqliteStore::build(Path::new("rocrate"), Path::new("rocrate.db"))?;
//! store.entity_table("Person")?;
//! let people = store.read_table("Person")?;
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::layout::{self, EdgeSource, LayoutLimits, TableLayout};
use crate::graph::metadata;
use crate::graph::traits::GraphStore;
use crate::models::{PropertyEdge, TabulatorConfig, Table, TYPE_PROPERTY};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS _property (
        source_id TEXT NOT NULL,
        property_label TEXT NOT NULL,
        value TEXT,
        target_id TEXT
    );
    CREATE INDEX IF NOT EXISTS _property_source ON _property (source_id);
    CREATE INDEX IF NOT EXISTS _property_label_value ON _property (property_label, value);
    CREATE TABLE IF NOT EXISTS _junction (
        type_name TEXT NOT NULL,
        table_name TEXT NOT NULL
    );
";

/// Name of the junction table of `property` on entity type `type_name`.
pub fn junction_name(type_name: &str, property: &str) -> String {
    format!("{type_name}_{property}")
}

/// Quotes an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite-backed [`GraphStore`].
pub struct SqliteStore {
    conn: Connection,
    /// Folder holding the metadata document; text references resolve here.
    crate_dir: PathBuf,
    config: TabulatorConfig,
    text_prop: Option<String>,
    limits: LayoutLimits,
    in_use: BTreeSet<String>,
}

impl SqliteStore {
    /// Converts an extracted crate into a database at `db_path`.
    ///
    /// A database that already holds edges is reused as-is.
    pub fn build(source_dir: &Path, db_path: &Path) -> Result<Self, AppError> {
        let located = metadata::locate_metadata(source_dir);
        let crate_dir = match &located {
            Ok(path) => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_dir.to_path_buf()),
            Err(_) => source_dir.to_path_buf(),
        };

        let mut store = Self::with_connection(Connection::open(db_path)?, crate_dir)?;

        let existing = store.edge_count()?;
        if existing > 0 {
            tracing::info!(
                "Reusing crate database at {} ({} edges)",
                db_path.display(),
                existing
            );
            return Ok(store);
        }

        let metadata_path = located?;
        let edges = metadata::read_edges(&metadata_path)?;
        store.load_edges(&edges)?;
        tracing::info!(
            "Loaded {} property edges from {} into {}",
            edges.len(),
            metadata_path.display(),
            db_path.display()
        );
        Ok(store)
    }

    /// Creates an empty in-memory store (useful for testing).
    pub fn open_in_memory(crate_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        Self::with_connection(Connection::open_in_memory()?, crate_dir.into())
    }

    fn with_connection(conn: Connection, crate_dir: PathBuf) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            crate_dir,
            config: TabulatorConfig::default(),
            text_prop: None,
            limits: LayoutLimits::default(),
            in_use: BTreeSet::new(),
        })
    }

    /// Replaces the table configuration.
    pub fn with_config(mut self, config: TabulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the property whose file reference is loaded as text.
    pub fn with_text_prop(mut self, text_prop: Option<String>) -> Self {
        self.text_prop = text_prop;
        self
    }

    pub fn with_limits(mut self, limits: LayoutLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Appends edges to the `_property` table in one transaction.
    pub fn load_edges(&mut self, edges: &[PropertyEdge]) -> Result<(), AppError> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO _property (source_id, property_label, value, target_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                insert.execute(params![
                    edge.source_id,
                    edge.label,
                    edge.value,
                    edge.target_id
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn edge_count(&self) -> Result<i64, AppError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM _property", [], |row| row.get(0))?)
    }

    fn write_layout(&mut self, type_name: &str, layout: &TableLayout) -> Result<(), AppError> {
        let table = quote_ident(type_name);
        let tx = self.conn.transaction()?;

        let stale: Vec<String> = {
            let mut stmt = tx.prepare("SELECT table_name FROM _junction WHERE type_name = ?1")?;
            let names = stmt
                .query_map(params![type_name], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            names
        };
        for name in &stale {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))?;
        }
        tx.execute("DELETE FROM _junction WHERE type_name = ?1", params![type_name])?;

        let column_defs = layout
            .columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({column_defs});"
        ))?;

        {
            let placeholders = vec!["?"; layout.columns.len()].join(", ");
            let mut insert = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
            for row in &layout.rows {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }

        for (property, pairs) in &layout.junctions {
            let name = junction_name(type_name, property);
            let junction = quote_ident(&name);
            tx.execute_batch(&format!(
                "DROP TABLE IF EXISTS {junction};
                 CREATE TABLE {junction} (entity_id TEXT NOT NULL, target_id TEXT NOT NULL);"
            ))?;
            {
                let mut insert = tx.prepare(&format!(
                    "INSERT INTO {junction} (entity_id, target_id) VALUES (?1, ?2)"
                ))?;
                for (source, target) in pairs {
                    insert.execute(params![source, target])?;
                }
            }
            tx.execute(
                "INSERT INTO _junction (type_name, table_name) VALUES (?1, ?2)",
                params![type_name, name],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl EdgeSource for SqliteStore {
    fn edges(&self, entity_id: &str) -> Result<Vec<PropertyEdge>, AppError> {
        self.fetch_properties(entity_id)
    }

    fn text(&self, reference: &str) -> Option<String> {
        let relative = Path::new(reference.trim_start_matches("./"));
        if reference.contains("://")
            || relative.is_absolute()
            || relative.components().any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        let path = self.crate_dir.join(relative);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("No text at {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl GraphStore for SqliteStore {
    fn entity_table(&mut self, type_name: &str) -> Result<(), AppError> {
        let ids = self.fetch_ids(type_name)?;
        if ids.is_empty() {
            return Err(AppError::UnknownTable(type_name.to_string()));
        }

        let policy = self.config.table(type_name).cloned().unwrap_or_default();
        let layout = layout::lay_out(
            type_name,
            &ids,
            &policy,
            self.limits,
            self.text_prop.as_deref(),
            &*self,
        )?;

        self.write_layout(type_name, &layout)?;
        tracing::debug!(
            "Built table {} ({} rows, {} columns, {} junctions)",
            type_name,
            layout.rows.len(),
            layout.columns.len(),
            layout.junctions.len()
        );

        self.config.table_mut(type_name).all_props = layout.all_props;
        Ok(())
    }

    fn use_tables(&mut self, type_names: &[String]) -> Result<(), AppError> {
        let pending: Vec<&String> = type_names
            .iter()
            .filter(|t| !self.in_use.contains(*t))
            .collect();
        if pending.is_empty() {
            return Err(AppError::AlreadyBuilt(type_names.join(", ")));
        }

        for type_name in pending {
            self.entity_table(type_name)?;
            self.in_use.insert(type_name.clone());
        }
        Ok(())
    }

    fn fetch_ids(&self, type_name: &str) -> Result<Vec<String>, AppError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source_id FROM _property
             WHERE property_label = ?1 AND value = ?2
             GROUP BY source_id
             ORDER BY MIN(rowid)",
        )?;
        let ids = stmt
            .query_map(params![TYPE_PROPERTY, type_name], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn fetch_properties(&self, entity_id: &str) -> Result<Vec<PropertyEdge>, AppError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT source_id, property_label, value, target_id FROM _property
             WHERE source_id = ?1
             ORDER BY rowid",
        )?;
        let edges = stmt
            .query_map(params![entity_id], |row| {
                Ok(PropertyEdge {
                    source_id: row.get(0)?,
                    label: row.get(1)?,
                    value: row.get(2)?,
                    target_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    fn expand_properties(&mut self, type_name: &str, properties: &[String]) {
        self.config
            .table_mut(type_name)
            .expand_props
            .extend(properties.iter().cloned());
    }

    fn infer_types(&self) -> Result<BTreeSet<String>, AppError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT value FROM _property
             WHERE property_label = ?1 AND value IS NOT NULL",
        )?;
        let types = stmt
            .query_map(params![TYPE_PROPERTY], |row| row.get(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;
        Ok(types)
    }

    fn table_exists(&self, name: &str) -> Result<bool, AppError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn read_table(&self, name: &str) -> Result<Table, AppError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut table = Table::new(columns);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(json_cell(row.get_ref(idx)?));
            }
            table.push_row(cells);
        }
        Ok(table)
    }

    fn config(&self) -> &TabulatorConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut TabulatorConfig {
        &mut self.config
    }
}

fn json_cell(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
