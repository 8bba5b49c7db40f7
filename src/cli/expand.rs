//! Expand command handler.

use color_eyre::Result;

use crate::config::Settings;
use crate::graph::GraphStore;
use crate::tabulator::Tabulator;

use super::{App, CorpusArgs};

impl App {
    /// Expand a table and print the observed target types per property.
    pub fn run_expand(
        &self,
        settings: &Settings,
        corpus: &CorpusArgs,
        table: &str,
        types: &[String],
        sample: Option<usize>,
    ) -> Result<()> {
        let mut tabulator = Tabulator::open(&corpus.reference, settings, self.refresh)?;
        let targets = (!types.is_empty()).then_some(types);
        let observed = tabulator.expand(table, targets, sample)?;

        if observed.is_empty() {
            println!("No linked properties in {table}");
            return Ok(());
        }

        let policy = tabulator.store().config().table(table).cloned().unwrap_or_default();
        for (property, target_types) in &observed {
            let marker = if policy.is_expanded(property) {
                "expanded"
            } else if policy.is_ignored(property) {
                "ignored"
            } else {
                "kept"
            };
            let names: Vec<&str> = target_types.iter().map(String::as_str).collect();
            println!("{property}\t{marker}\t{}", names.join(", "));
        }
        Ok(())
    }
}
