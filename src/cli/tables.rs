//! Table command handlers.

use color_eyre::Result;

use crate::config::Settings;
use crate::tabulator::Tabulator;

use super::output::write_table;
use super::{App, TableArgs};

/// The cleaned tables the CLI can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Text,
    People,
    Organizations,
    Speakers,
}

impl TableKind {
    fn label(self) -> &'static str {
        match self {
            TableKind::Text => "text",
            TableKind::People => "Person",
            TableKind::Organizations => "Organization",
            TableKind::Speakers => "Speaker",
        }
    }
}

impl App {
    /// Write one of the cleaned tables.
    pub fn run_table(&self, settings: &Settings, kind: TableKind, args: &TableArgs) -> Result<()> {
        let mut tabulator = Tabulator::open(&args.corpus.reference, settings, self.refresh)?;

        let table = match kind {
            TableKind::Text => tabulator.text(args.full)?,
            TableKind::People => tabulator.people(args.full)?,
            TableKind::Organizations => tabulator.organizations(args.full)?,
            TableKind::Speakers => tabulator.speakers(args.full)?,
        };

        match table {
            Some(table) => write_table(&table, args.output.as_deref())?,
            None => tracing::info!("No {} table in this corpus", kind.label()),
        }
        Ok(())
    }
}
