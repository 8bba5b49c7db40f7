//! Graph store layer: from a crate's JSON-LD graph to relational tables.
//!
//! # Architecture
//!
//! - [`metadata`] - Reads `ro-crate-metadata.json` into [`PropertyEdge`](crate::models::PropertyEdge)s
//! - [`layout`] - Decides the columns and rows of one entity table
//! - [`GraphStore`] - The store interface the services are written against
//! - [`backends`] - Store implementations (SQLite)
//!
//! # Usage
//!
//! ```ignore
//! use ldaca_tabulator::graph::backends::sqlite::SqliteStore;
//! use ldaca_tabulator::graph::GraphStore;
//!
//! let mut store = SqliteStore::build(crate_dir, db_path)?;
//! for id in store.fetch_ids("Person")? {
//!     let edges = store.fetch_properties(&id)?;
//! }
//! store.entity_table("Person")?;
//! let people = store.read_table("Person")?;
//! ```

mod traits;

pub mod backends;
pub mod layout;
pub mod metadata;

// Re-export core types
pub use layout::{lay_out, EdgeSource, LayoutLimits, TableLayout, ENTITY_ID_COLUMN};
pub use traits::GraphStore;
