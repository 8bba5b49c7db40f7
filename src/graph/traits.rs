//! Core trait for the graph-to-relational store.
//!
//! Services depend on [`GraphStore`] only. The SQLite backend in
//! [`crate::graph::backends::sqlite`] is the production implementation;
//! tests substitute their own.

use std::collections::BTreeSet;

use crate::error::AppError;
use crate::models::{PropertyEdge, TabulatorConfig, Table};

/// A relational projection of a crate's entity graph.
///
/// The store owns the effective table configuration. Changes made through
/// [`config_mut`](GraphStore::config_mut) apply to every later build.
pub trait GraphStore {
    /// Builds (or rebuilds) the table of one entity type.
    ///
    /// # Errors
    ///
    /// - [`AppError::UnknownTable`] if no entity has this type.
    /// - [`AppError::CardinalityOverflow`] if a property cannot be laid out.
    fn entity_table(&mut self, type_name: &str) -> Result<(), AppError>;

    /// Declares tables as in use and builds the ones not yet declared.
    ///
    /// # Errors
    ///
    /// [`AppError::AlreadyBuilt`] if every listed table was already declared.
    fn use_tables(&mut self, type_names: &[String]) -> Result<(), AppError>;

    /// Ids of all entities declaring `type_name`, in document order.
    fn fetch_ids(&self, type_name: &str) -> Result<Vec<String>, AppError>;

    /// Outgoing edges of one entity, in document order.
    fn fetch_properties(&self, entity_id: &str) -> Result<Vec<PropertyEdge>, AppError>;

    /// Marks link properties of a table for expansion on its next build.
    fn expand_properties(&mut self, type_name: &str, properties: &[String]);

    /// Every type value declared in the graph.
    fn infer_types(&self) -> Result<BTreeSet<String>, AppError>;

    /// Whether a table (entity or junction) exists in the store.
    fn table_exists(&self, name: &str) -> Result<bool, AppError>;

    /// Reads a whole table.
    fn read_table(&self, name: &str) -> Result<Table, AppError>;

    fn config(&self) -> &TabulatorConfig;

    fn config_mut(&mut self) -> &mut TabulatorConfig;
}
