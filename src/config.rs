//! Settings with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/ldaca-tabulator/config.toml` (XDG) or platform config dir
//! 3. Project config: `ldaca-tabulator.toml`
//! 4. Environment variables: `LDACA_*`, nested keys separated by `__`
//!
//! # Example
//!
//! ```toml
//! [workspace]
//! root = "/data/corpora"
//! folder_name = "cooee"
//!
//! [configs]
//! general = "configs/general/general-config.json"
//! corpora_dir = "configs/corpora"
//!
//! [tabulator]
//! interest_types = ["Person", "Organization"]
//! max_values = 100
//! ```
//!
//! `LDACA_TABULATOR__MAX_COLUMNS=500` overrides `tabulator.max_columns`.
//!
//! These settings cover where things live and the build limits. The per-table
//! policy (ignored and expanded properties) lives in the JSON configuration
//! files handled by [`crate::services::ConfigResolver`].

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    #[serde(default)]
    pub configs: ConfigPaths,
    #[serde(default)]
    pub tabulator: TabulatorSettings,
    #[serde(default)]
    pub download: DownloadSettings,
}

/// Where an acquired corpus is extracted and its database written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Directory holding the extract folder and the database.
    pub root: PathBuf,
    /// Extract folder name, relative to `root`.
    pub folder_name: String,
    /// Database file name. Defaults to `<folder_name>.db`.
    #[serde(default)]
    pub db_name: Option<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            folder_name: "rocrate".to_string(),
            db_name: None,
        }
    }
}

impl WorkspaceSettings {
    /// Directory the archive is extracted into.
    pub fn extract_dir(&self) -> PathBuf {
        self.root.join(&self.folder_name)
    }

    /// Path of the SQLite database.
    pub fn db_path(&self) -> PathBuf {
        match &self.db_name {
            Some(name) => self.root.join(name),
            None => self.root.join(format!("{}.db", self.folder_name)),
        }
    }
}

/// Locations of the JSON table-policy files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPaths {
    /// General (corpus-independent) configuration.
    pub general: PathBuf,
    /// Directory of corpus-specific files named `<corpus id>.json`.
    pub corpora_dir: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            general: PathBuf::from("configs/general/general-config.json"),
            corpora_dir: PathBuf::from("configs/corpora"),
        }
    }
}

/// Table-building behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabulatorSettings {
    /// Property whose file reference is loaded as text.
    pub text_prop: String,
    /// Entity type holding the text records.
    pub text_table: String,
    /// Types whose links are expanded into the text table.
    /// Empty means "infer from the corpus".
    pub interest_types: Vec<String>,
    /// Type values never used as inferred expansion targets.
    pub excluded_types: Vec<String>,
    /// Junction table linking text records to speakers.
    pub speaker_junction: String,
    /// Entity type the speaker junction points at.
    pub speaker_table: String,
    /// Column limit per table, `entity_id` included.
    pub max_columns: usize,
    /// Highest suffix index a multi-valued property may spread to.
    pub max_values: usize,
}

impl Default for TabulatorSettings {
    fn default() -> Self {
        Self {
            text_prop: "ldac:mainText".to_string(),
            text_table: "RepositoryObject".to_string(),
            interest_types: vec!["Person".to_string(), "Organization".to_string()],
            excluded_types: vec!["File".to_string()],
            speaker_junction: "RepositoryObject_ldac:speaker".to_string(),
            speaker_table: "Person".to_string(),
            // SQLITE_MAX_COLUMN
            max_columns: 2000,
            max_values: 100,
        }
    }
}

/// Network fetch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Bound on the archive request, in seconds.
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self { timeout_secs: 20 }
    }
}

impl Settings {
    /// Load settings with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            // Layer 1: User config
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file("ldaca-tabulator.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("LDACA_").split("__"))
    }

    /// User config path: ~/.config/ldaca-tabulator/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home
                .join(".config")
                .join("ldaca-tabulator")
                .join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("ldaca-tabulator").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_workspace_defaults() {
        let ws = WorkspaceSettings::default();
        assert_eq!(ws.extract_dir(), PathBuf::from("./rocrate"));
        assert_eq!(ws.db_path(), PathBuf::from("./rocrate.db"));
    }

    #[test]
    fn test_workspace_explicit_db_name() {
        let ws = WorkspaceSettings {
            root: PathBuf::from("/tmp/w"),
            folder_name: "cooee".to_string(),
            db_name: Some("corpus.db".to_string()),
        };
        assert_eq!(ws.extract_dir(), PathBuf::from("/tmp/w/cooee"));
        assert_eq!(ws.db_path(), PathBuf::from("/tmp/w/corpus.db"));
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.tabulator.text_prop, "ldac:mainText");
        assert_eq!(settings.download.timeout_secs, 20);
        assert_eq!(settings.workspace.folder_name, "rocrate");
    }

    #[test]
    #[serial]
    fn test_env_overrides_nested_key() {
        std::env::set_var("LDACA_TABULATOR__MAX_COLUMNS", "500");
        let settings = Settings::load();
        std::env::remove_var("LDACA_TABULATOR__MAX_COLUMNS");

        let settings = settings.unwrap();
        assert_eq!(settings.tabulator.max_columns, 500);
        assert_eq!(settings.tabulator.max_values, 100);
    }
}
