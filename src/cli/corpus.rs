//! Corpus-level command handlers.

use std::path::Path;

use color_eyre::Result;

use crate::config::Settings;
use crate::tabulator::Tabulator;

use super::output::write_table;
use super::{App, CorpusArgs};

impl App {
    /// Print the tables of the corpus-specific configuration.
    pub fn run_corpus_tables(&self, settings: &Settings, corpus: &CorpusArgs) -> Result<()> {
        let tabulator = Tabulator::open(&corpus.reference, settings, self.refresh)?;
        println!("{}", tabulator.corpus_tables_list()?);
        Ok(())
    }

    /// Write a table built with the corpus-specific configuration.
    pub fn run_corpus_table(
        &self,
        settings: &Settings,
        corpus: &CorpusArgs,
        name: &str,
        output: Option<&Path>,
    ) -> Result<()> {
        let mut tabulator = Tabulator::open(&corpus.reference, settings, self.refresh)?;
        match tabulator.corpus_table(name)? {
            Some(table) => write_table(&table, output)?,
            None => tracing::info!("No {} table in this corpus", name),
        }
        Ok(())
    }

    /// Print the corpus summary.
    pub fn run_info(&self, settings: &Settings, corpus: &CorpusArgs) -> Result<()> {
        let tabulator = Tabulator::open(&corpus.reference, settings, self.refresh)?;
        println!("{}", tabulator.corpus_info()?);
        Ok(())
    }
}
