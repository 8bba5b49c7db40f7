//! Domain models for the crate graph and its tables.

mod entity;
mod table;
mod table_config;

pub use entity::{PropertyEdge, NAME_PROPERTY, TYPE_PROPERTY};
pub use table::Table;
pub use table_config::{TableConfig, TabulatorConfig};
