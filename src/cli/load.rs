//! Load command handler.

use color_eyre::Result;

use crate::config::Settings;
use crate::graph::GraphStore;
use crate::tabulator::Tabulator;

use super::{App, CorpusArgs};

impl App {
    /// Acquire the corpus, build its database and list the entity types.
    pub fn run_load(&self, settings: &Settings, corpus: &CorpusArgs) -> Result<()> {
        let tabulator = Tabulator::open(&corpus.reference, settings, self.refresh)?;
        let acquired = tabulator.acquired();
        tracing::info!(
            "Corpus extracted to {}, database at {}",
            acquired.extract_dir.display(),
            acquired.db_path.display()
        );

        let store = tabulator.store();
        for type_name in store.infer_types()? {
            let count = store.fetch_ids(&type_name)?.len();
            println!("{type_name}\t{count}");
        }
        Ok(())
    }
}
