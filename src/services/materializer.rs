//! Entity table materialization.

use crate::error::AppError;
use crate::graph::GraphStore;
use crate::models::Table;
use crate::services::expansion::{build_with_demotion, BuildAction, BuildOutcome};
use crate::services::hygiene::{drop_id_columns, drop_ignored_columns};

/// Builds entity tables and reads them back with the table policy applied.
///
/// Overflowing properties are demoted as in
/// [`build_with_demotion`]; an entity type the corpus lacks yields `None`.
pub struct Materializer<'s, S: GraphStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: GraphStore + ?Sized> Materializer<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// The table with ignored columns dropped and identifier columns kept.
    pub fn materialize_raw(&mut self, entity_type: &str) -> Result<Option<Table>, AppError> {
        if build_with_demotion(&mut *self.store, BuildAction::Entity(entity_type))?
            == BuildOutcome::Unrecognised
        {
            tracing::info!("No {} entities in this crate", entity_type);
            return Ok(None);
        }

        let table = self.store.read_table(entity_type)?;
        let policy = self
            .store
            .config()
            .table(entity_type)
            .cloned()
            .unwrap_or_default();
        Ok(Some(drop_ignored_columns(table, &policy)))
    }

    /// The table with ignored and identifier columns dropped.
    pub fn materialize(&mut self, entity_type: &str) -> Result<Option<Table>, AppError> {
        Ok(self.materialize_raw(entity_type)?.map(drop_id_columns))
    }
}
