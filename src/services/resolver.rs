//! Configuration resolver: general plus corpus-specific table policy.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ConfigPaths;
use crate::error::AppError;
use crate::models::TabulatorConfig;

/// `~`, the numeric corpus id, then `.` (e.g. `hdl10.26180~23961609.v1`).
static CORPUS_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~(\d+)\.").expect("corpus id pattern is valid"));

/// Extracts the numeric corpus identifier from a corpus reference.
pub fn corpus_id(reference: &str) -> Option<&str> {
    CORPUS_ID
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Loads and merges the JSON table-policy files.
///
/// Resolution never writes back: the returned configuration is a fresh
/// value each time.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    general: PathBuf,
    corpora_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(general: impl Into<PathBuf>, corpora_dir: impl Into<PathBuf>) -> Self {
        Self {
            general: general.into(),
            corpora_dir: corpora_dir.into(),
        }
    }

    pub fn from_paths(paths: &ConfigPaths) -> Self {
        Self::new(paths.general.clone(), paths.corpora_dir.clone())
    }

    /// The general (corpus-independent) configuration.
    pub fn general(&self) -> Result<TabulatorConfig, AppError> {
        TabulatorConfig::load(&self.general)
    }

    /// Path of the corpus-specific file for `reference`.
    pub fn corpus_path(&self, reference: &str) -> Result<PathBuf, AppError> {
        let id = corpus_id(reference).ok_or_else(|| {
            AppError::ConfigNotFound(format!("no corpus id in reference '{reference}'"))
        })?;
        Ok(self.corpora_dir.join(format!("{id}.json")))
    }

    /// The corpus-specific configuration for `reference`.
    pub fn corpus(&self, reference: &str) -> Result<TabulatorConfig, AppError> {
        let path = self.corpus_path(reference)?;
        TabulatorConfig::load(&path)
    }

    /// Effective configuration: the general one, overlaid with the corpus
    /// file when `corpus_specific` is set.
    pub fn resolve(
        &self,
        reference: &str,
        corpus_specific: bool,
    ) -> Result<TabulatorConfig, AppError> {
        let mut config = self.general()?;
        if corpus_specific {
            self.overlay_corpus(&mut config, reference)?;
        }
        Ok(config)
    }

    /// Merges the corpus file for `reference` into `config`.
    pub fn overlay_corpus(
        &self,
        config: &mut TabulatorConfig,
        reference: &str,
    ) -> Result<(), AppError> {
        config.merge_tables(self.corpus(reference)?);
        Ok(())
    }

    /// Human-readable list of the tables the corpus file defines.
    ///
    /// An unparseable reference yields a message rather than an error; a
    /// missing corpus file is still an error.
    pub fn list_corpus_tables(&self, reference: &str) -> Result<String, AppError> {
        if corpus_id(reference).is_none() {
            return Ok("Could not extract corpus ID from reference. Cannot load config.".to_string());
        }
        let names = self.corpus(reference)?.table_names();
        Ok(format!(
            "Corpus-specific tables: [{}]. Use corpus-table <name> to load the data.",
            names.join(", ")
        ))
    }
}
