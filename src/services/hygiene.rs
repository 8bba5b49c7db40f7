//! Column hygiene filters applied after materialization.
//!
//! All filters are total: empty tables and absent columns are fine.

use std::collections::HashSet;

use crate::models::{TableConfig, Table};

/// Columns with a larger share of missing values are dropped.
pub const MAX_NULL_FRACTION: f64 = 0.99;

/// Drops every column whose name contains `_id` anywhere.
///
/// Catches the key column (`entity_id`), link id columns (`author_id`,
/// `conformsTo_1_id`) and expanded sub-id columns alike.
pub fn drop_id_columns(table: Table) -> Table {
    table.retain_columns(|name| !name.contains("_id"))
}

/// Drops columns whose fraction of nulls exceeds [`MAX_NULL_FRACTION`].
pub fn drop_high_null_columns(table: Table) -> Table {
    let sparse: HashSet<String> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| table.null_fraction(*idx) > MAX_NULL_FRACTION)
        .map(|(_, name)| name.clone())
        .collect();
    if sparse.is_empty() {
        return table;
    }
    table.retain_columns(|name| !sparse.contains(name))
}

/// Drops columns of ignored properties, including their prefixed sub-columns.
pub fn drop_ignored_columns(table: Table, policy: &TableConfig) -> Table {
    if policy.ignore_props.is_empty() {
        return table;
    }
    table.retain_columns(|name| !policy.is_ignored(name))
}
