//! ldaca-tabulator - analysis-ready tables from LDaCA RO-Crate corpora.
//!
//! Flattens the JSON-LD entity graph of an RO-Crate into relational tables,
//! expands links to entities of interest into prefixed columns and cleans
//! the result for analysis.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod services;
pub mod tabulator;

pub use tabulator::Tabulator;
