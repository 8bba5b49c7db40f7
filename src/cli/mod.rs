//! CLI module for ldaca-tabulator.
//!
//! Subcommands:
//! - `load`: Acquire a corpus and build its database
//! - `text`, `people`, `organizations`, `speakers`: Write a cleaned table as CSV
//! - `corpus-tables`: List the corpus-specific tables
//! - `corpus-table`: Write a corpus-specific table as CSV
//! - `info`: Print a summary of the corpus
//! - `expand`: Run link expansion on a table and report observed target types

mod corpus;
mod expand;
mod load;
mod output;
mod tables;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;

use crate::config::Settings;

pub use tables::TableKind;

/// ldaca-tabulator - analysis-ready tables from LDaCA RO-Crate corpora
#[derive(Parser)]
#[command(name = "ldaca-tabulator")]
#[command(about = "Tabulate LDaCA RO-Crate corpora into analysis-ready tables")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Download the corpus again and rebuild its database
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Directory holding the extracted corpus and its database
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// The corpus to work on.
#[derive(Args, Clone)]
pub struct CorpusArgs {
    /// URL or local path of the zipped RO-Crate
    pub reference: String,
}

/// Options shared by the table-writing commands.
#[derive(Args, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Keep near-empty columns
    #[arg(long)]
    pub full: bool,

    /// Write CSV to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Acquire the corpus and build its database
    Load(CorpusArgs),

    /// Text records with expanded links and speaker names
    Text(TableArgs),

    /// The Person table
    People(TableArgs),

    /// The Organization table
    Organizations(TableArgs),

    /// The Speaker table
    Speakers(TableArgs),

    /// List the tables of the corpus-specific configuration
    CorpusTables(CorpusArgs),

    /// A table built with the corpus-specific configuration
    CorpusTable {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Entity type of the table
        name: String,

        /// Write CSV to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summary of the corpus root dataset
    Info(CorpusArgs),

    /// Expand the link properties of a table
    Expand {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Entity type of the table
        table: String,

        /// Target types of interest (repeatable); inferred when omitted
        #[arg(long = "type")]
        types: Vec<String>,

        /// Only scan the first N entities
        #[arg(long)]
        sample: Option<usize>,
    },
}

impl App {
    /// Run the CLI application.
    pub fn run(self) -> Result<()> {
        let settings = self.settings()?;
        match &self.command {
            Command::Load(corpus) => self.run_load(&settings, corpus),
            Command::Text(args) => self.run_table(&settings, TableKind::Text, args),
            Command::People(args) => self.run_table(&settings, TableKind::People, args),
            Command::Organizations(args) => {
                self.run_table(&settings, TableKind::Organizations, args)
            }
            Command::Speakers(args) => self.run_table(&settings, TableKind::Speakers, args),
            Command::CorpusTables(corpus) => self.run_corpus_tables(&settings, corpus),
            Command::CorpusTable {
                corpus,
                name,
                output,
            } => self.run_corpus_table(&settings, corpus, name, output.as_deref()),
            Command::Info(corpus) => self.run_info(&settings, corpus),
            Command::Expand {
                corpus,
                table,
                types,
                sample,
            } => self.run_expand(&settings, corpus, table, types, *sample),
        }
    }

    /// Layered settings with the command-line workspace applied.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load()?;
        if let Some(root) = &self.workspace {
            settings.workspace.root = root.clone();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_command() {
        let app = App::try_parse_from([
            "ldaca-tabulator",
            "--refresh",
            "text",
            "https://example.org/corpus~123.v1",
            "--full",
            "-o",
            "text.csv",
        ])
        .unwrap();

        assert!(app.refresh);
        match app.command {
            Command::Text(args) => {
                assert_eq!(args.corpus.reference, "https://example.org/corpus~123.v1");
                assert!(args.full);
                assert_eq!(args.output, Some(PathBuf::from("text.csv")));
            }
            _ => panic!("expected text command"),
        }
    }

    #[test]
    fn test_parse_expand_command() {
        let app = App::try_parse_from([
            "ldaca-tabulator",
            "expand",
            "corpus.zip",
            "RepositoryObject",
            "--type",
            "Person",
            "--type",
            "Organization",
            "--sample",
            "50",
            "--workspace",
            "/tmp/ws",
        ])
        .unwrap();

        assert_eq!(app.workspace, Some(PathBuf::from("/tmp/ws")));
        match app.command {
            Command::Expand {
                table,
                types,
                sample,
                ..
            } => {
                assert_eq!(table, "RepositoryObject");
                assert_eq!(types, ["Person", "Organization"]);
                assert_eq!(sample, Some(50));
            }
            _ => panic!("expected expand command"),
        }
    }
}
