//! Backend implementations of the graph store.
//!
//! Each backend implements [`GraphStore`](crate::graph::GraphStore) and
//! feeds the column layout through [`EdgeSource`](crate::graph::EdgeSource).
//!
//! # Available Backends
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | SQLite (rusqlite, bundled) | [`sqlite`] | Available |
//!
//! # Implementing a Backend
//!
//! 1. Load the crate's property edges into backend storage
//! 2. Implement `EdgeSource` so [`lay_out`](crate::graph::lay_out) can read them
//! 3. Implement `GraphStore`, writing each `TableLayout` as a table plus its
//!    junction tables

pub mod sqlite;
