//! The tabulation session over one corpus.
//!
//! A [`Tabulator`] owns the crate database of one corpus and the effective
//! table configuration. Configuration changes made by one operation (link
//! expansion, property demotion, corpus-specific overrides) carry over to
//! the operations that follow.

use std::fmt::Write as _;

use crate::config::{Settings, TabulatorSettings};
use crate::error::AppError;
use crate::graph::backends::sqlite::SqliteStore;
use crate::graph::metadata::METADATA_FILE;
use crate::graph::{GraphStore, LayoutLimits};
use crate::models::{PropertyEdge, Table, NAME_PROPERTY};
use crate::services::{
    attach_speakers, drop_high_null_columns, drop_id_columns, Acquired, ArchiveAcquirer,
    ConfigResolver, ExpansionEngine, Materializer, PropertyTypes,
};

const PERSON: &str = "Person";
const ORGANIZATION: &str = "Organization";
const SPEAKER: &str = "Speaker";

/// Analysis-ready tables of one RO-Crate corpus.
pub struct Tabulator {
    reference: String,
    acquired: Acquired,
    store: SqliteStore,
    resolver: ConfigResolver,
    settings: TabulatorSettings,
}

impl Tabulator {
    /// Acquires the corpus, builds (or reuses) its database and loads the
    /// general table configuration.
    pub fn open(reference: &str, settings: &Settings, refresh: bool) -> Result<Self, AppError> {
        let acquired = ArchiveAcquirer::from_settings(&settings.download).acquire(
            reference,
            &settings.workspace,
            refresh,
        )?;

        let resolver = ConfigResolver::from_paths(&settings.configs);
        let config = resolver.resolve(reference, false)?;

        let tabulator = &settings.tabulator;
        let store = SqliteStore::build(&acquired.extract_dir, &acquired.db_path)?
            .with_config(config)
            .with_text_prop(Some(tabulator.text_prop.clone()))
            .with_limits(LayoutLimits {
                max_columns: tabulator.max_columns,
                max_values: tabulator.max_values,
            });

        Ok(Self {
            reference: reference.to_string(),
            acquired,
            store,
            resolver,
            settings: tabulator.clone(),
        })
    }

    pub fn acquired(&self) -> &Acquired {
        &self.acquired
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Text records with links to the types of interest expanded and
    /// speaker names attached.
    ///
    /// Identifier columns are dropped, and near-empty columns too unless
    /// `full` is set.
    pub fn text(&mut self, full: bool) -> Result<Option<Table>, AppError> {
        let text_table = self.settings.text_table.clone();
        let interest = self.settings.interest_types.clone();
        let targets = (!interest.is_empty()).then_some(interest.as_slice());

        ExpansionEngine::new(&mut self.store, &self.settings.excluded_types)
            .expand_for_entity_types(&text_table, targets, None)?;

        let Some(table) = Materializer::new(&mut self.store).materialize_raw(&text_table)? else {
            return Ok(None);
        };

        let table = attach_speakers(
            &mut self.store,
            table,
            &self.settings.speaker_junction,
            &self.settings.speaker_table,
        )?;
        Ok(Some(clean(drop_id_columns(table), full)))
    }

    pub fn people(&mut self, full: bool) -> Result<Option<Table>, AppError> {
        self.entity(PERSON, full)
    }

    pub fn organizations(&mut self, full: bool) -> Result<Option<Table>, AppError> {
        self.entity(ORGANIZATION, full)
    }

    pub fn speakers(&mut self, full: bool) -> Result<Option<Table>, AppError> {
        self.entity(SPEAKER, full)
    }

    fn entity(&mut self, entity_type: &str, full: bool) -> Result<Option<Table>, AppError> {
        let table = Materializer::new(&mut self.store).materialize(entity_type)?;
        Ok(table.map(|t| clean(t, full)))
    }

    /// Summary of the tables the corpus-specific configuration defines.
    pub fn corpus_tables_list(&self) -> Result<String, AppError> {
        self.resolver.list_corpus_tables(&self.reference)
    }

    /// Loads a table with the corpus-specific configuration in effect.
    ///
    /// The corpus entries stay merged into the session configuration;
    /// properties demoted earlier stay ignored.
    pub fn corpus_table(&mut self, name: &str) -> Result<Option<Table>, AppError> {
        self.resolver
            .overlay_corpus(self.store.config_mut(), &self.reference)?;
        Materializer::new(&mut self.store).materialize(name)
    }

    /// Markdown summary of the crate's root dataset.
    pub fn corpus_info(&self) -> Result<String, AppError> {
        let root = self
            .store
            .fetch_properties(METADATA_FILE)?
            .into_iter()
            .find(|e| e.label == "about")
            .and_then(|e| e.target_id.or(e.value))
            .unwrap_or_else(|| "./".to_string());
        let edges = self.store.fetch_properties(&root)?;

        let name = first_value(&edges, NAME_PROPERTY).unwrap_or_else(|| root.clone());
        let mut info = format!("# {name}\n");
        if let Some(description) = first_value(&edges, "description") {
            let _ = write!(info, "\n{description}\n");
        }

        let mut facts = Vec::new();
        if let Some(published) = first_value(&edges, "datePublished") {
            facts.push(format!("- **Published:** {published}"));
        }
        if let Some(publisher) = edges.iter().find(|e| e.label == "publisher") {
            let publisher = self.display_value(publisher)?;
            facts.push(format!("- **Publisher:** {publisher}"));
        }
        if !facts.is_empty() {
            let _ = write!(info, "\n{}\n", facts.join("\n"));
        }
        Ok(info)
    }

    /// Runs link expansion on any table of the corpus.
    pub fn expand(
        &mut self,
        table: &str,
        target_types: Option<&[String]>,
        sample: Option<usize>,
    ) -> Result<PropertyTypes, AppError> {
        ExpansionEngine::new(&mut self.store, &self.settings.excluded_types)
            .expand_for_entity_types(table, target_types, sample)
    }

    fn display_value(&self, edge: &PropertyEdge) -> Result<String, AppError> {
        let Some(target) = &edge.target_id else {
            return Ok(edge.value.clone().unwrap_or_default());
        };
        let edges = self.store.fetch_properties(target)?;
        Ok(first_value(&edges, NAME_PROPERTY).unwrap_or_else(|| target.clone()))
    }
}

fn clean(table: Table, full: bool) -> Table {
    if full {
        table
    } else {
        drop_high_null_columns(table)
    }
}

fn first_value(edges: &[PropertyEdge], label: &str) -> Option<String> {
    edges
        .iter()
        .find(|e| e.label == label)
        .and_then(|e| e.value.clone())
}
