//! Link expansion: decide which link properties of a table are flattened
//! into prefixed columns, and build tables while demoting properties that
//! overflow the store's limits.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::AppError;
use crate::graph::GraphStore;
use crate::models::TableConfig;

/// Target types observed per property label.
pub type PropertyTypes = BTreeMap<String, BTreeSet<String>>;

/// Store operation retried by [`build_with_demotion`].
#[derive(Debug, Clone, Copy)]
pub enum BuildAction<'a> {
    /// Build one entity table.
    Entity(&'a str),
    /// Declare tables in use, building the new ones.
    Use(&'a [String]),
}

/// Non-failing result of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    AlreadyBuilt,
    /// The store has no entities of the requested type.
    Unrecognised,
}

/// Runs `action`, demoting overflowing properties into `ignore_props` and
/// retrying until it succeeds.
///
/// The overflowing column has its numeric suffix stripped before being
/// recorded (`publisher_role_7` becomes `publisher_role`). Hitting the same
/// demotion twice is fatal, so the loop always ends.
pub fn build_with_demotion<S: GraphStore + ?Sized>(
    store: &mut S,
    action: BuildAction<'_>,
) -> Result<BuildOutcome, AppError> {
    let mut demoted: BTreeSet<(String, String)> = BTreeSet::new();
    loop {
        let result = match action {
            BuildAction::Entity(type_name) => store.entity_table(type_name),
            BuildAction::Use(type_names) => store.use_tables(type_names),
        };

        match result {
            Ok(()) => return Ok(BuildOutcome::Built),
            Err(AppError::CardinalityOverflow {
                table,
                column,
                kind,
            }) => {
                let property = strip_numeric_suffix(&column).to_string();
                if !demoted.insert((table.clone(), property.clone())) {
                    return Err(AppError::CardinalityOverflow {
                        table,
                        column,
                        kind,
                    });
                }
                tracing::warn!(
                    "Too many {} in table {} for {}; ignoring {}",
                    kind,
                    table,
                    column,
                    property
                );
                store.config_mut().demote(&table, &property);
            }
            Err(e) if e.is_benign() => {
                tracing::info!("{} ({})", e, e.code());
                return Ok(match e {
                    AppError::AlreadyBuilt(_) => BuildOutcome::AlreadyBuilt,
                    _ => BuildOutcome::Unrecognised,
                });
            }
            Err(e) => return Err(e),
        }
    }
}

/// Strips one trailing `_<digits>` from a column name.
pub fn strip_numeric_suffix(column: &str) -> &str {
    match column.rsplit_once('_') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => column,
    }
}

/// Labels whose observed target types meet `interest`, that the table
/// declares and that are not ignored. Sorted.
pub fn select_candidates(
    observed: &PropertyTypes,
    interest: &BTreeSet<String>,
    policy: &TableConfig,
) -> Vec<String> {
    observed
        .iter()
        .filter(|(_, types)| !types.is_disjoint(interest))
        .filter(|(label, _)| policy.all_props.contains(label.as_str()))
        .filter(|(label, _)| !policy.is_ignored(label))
        .map(|(label, _)| label.clone())
        .collect()
}

/// Expands the link properties of a table towards entity types of interest.
pub struct ExpansionEngine<'s, S: GraphStore + ?Sized> {
    store: &'s mut S,
    excluded_types: BTreeSet<String>,
    target_types: HashMap<String, BTreeSet<String>>,
}

impl<'s, S: GraphStore + ?Sized> ExpansionEngine<'s, S> {
    pub fn new(store: &'s mut S, excluded_types: &[String]) -> Self {
        Self {
            store,
            excluded_types: excluded_types.iter().cloned().collect(),
            target_types: HashMap::new(),
        }
    }

    /// Marks candidate link properties of `table` for expansion and
    /// rebuilds it.
    ///
    /// Without `target_types` the interest set is every type the store
    /// declares minus the excluded ones. With `sample` only the first
    /// entities are scanned. Returns the observed target types per label.
    pub fn expand_for_entity_types(
        &mut self,
        table: &str,
        target_types: Option<&[String]>,
        sample: Option<usize>,
    ) -> Result<PropertyTypes, AppError> {
        let interest: BTreeSet<String> = match target_types {
            Some(types) => types.iter().cloned().collect(),
            None => self
                .store
                .infer_types()?
                .into_iter()
                .filter(|t| !self.excluded_types.contains(t))
                .collect(),
        };

        let built = self
            .store
            .config()
            .table(table)
            .is_some_and(|policy| !policy.all_props.is_empty());
        if !built {
            let outcome = build_with_demotion(&mut *self.store, BuildAction::Entity(table))?;
            if outcome == BuildOutcome::Unrecognised {
                return Ok(PropertyTypes::new());
            }
        }

        let observed = self.observe(table, sample)?;
        let policy = self.store.config().table(table).cloned().unwrap_or_default();
        let candidates = select_candidates(&observed, &interest, &policy);
        if candidates.is_empty() {
            tracing::debug!("No expansion candidates in {}", table);
            return Ok(observed);
        }

        tracing::info!("Expanding {} in {}", candidates.join(", "), table);
        self.store.expand_properties(table, &candidates);
        build_with_demotion(&mut *self.store, BuildAction::Entity(table))?;
        Ok(observed)
    }

    fn observe(&mut self, table: &str, sample: Option<usize>) -> Result<PropertyTypes, AppError> {
        let mut ids = self.store.fetch_ids(table)?;
        if let Some(limit) = sample {
            ids.truncate(limit);
        }

        let mut observed = PropertyTypes::new();
        for id in &ids {
            for edge in self.store.fetch_properties(id)? {
                let Some(target) = edge.target_id.as_deref() else {
                    continue;
                };
                let types = self.types_of(target)?;
                if types.is_empty() {
                    continue;
                }
                observed
                    .entry(edge.label)
                    .or_default()
                    .extend(types.iter().cloned());
            }
        }
        Ok(observed)
    }

    fn types_of(&mut self, entity_id: &str) -> Result<&BTreeSet<String>, AppError> {
        if !self.target_types.contains_key(entity_id) {
            let types = self
                .store
                .fetch_properties(entity_id)?
                .into_iter()
                .filter(|e| e.is_type())
                .filter_map(|e| e.value)
                .collect();
            self.target_types.insert(entity_id.to_string(), types);
        }
        Ok(&self.target_types[entity_id])
    }
}
