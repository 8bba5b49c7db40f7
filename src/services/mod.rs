//! Table services over a [`GraphStore`](crate::graph::GraphStore).
//!
//! Services hold a `&mut` borrow of the store for the duration of one
//! operation; configuration changes they make (expansion, demotion) stay on
//! the store for later builds.

pub mod acquire;
pub mod enrichment;
pub mod expansion;
pub mod hygiene;
mod materializer;
mod resolver;

pub use acquire::{Acquired, ArchiveAcquirer};
pub use enrichment::{attach_speakers, SPEAKERS_COLUMN};
pub use expansion::{
    build_with_demotion, select_candidates, strip_numeric_suffix, BuildAction, BuildOutcome,
    ExpansionEngine, PropertyTypes,
};
pub use hygiene::{drop_high_null_columns, drop_id_columns, drop_ignored_columns};
pub use materializer::Materializer;
pub use resolver::{corpus_id, ConfigResolver};
