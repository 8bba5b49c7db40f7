//! Archive acquisition: download and extract a crate into the workspace.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{DownloadSettings, WorkspaceSettings};
use crate::error::AppError;

/// Where an acquired crate lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub extract_dir: PathBuf,
    pub db_path: PathBuf,
    /// False when an existing extraction was reused.
    pub fetched: bool,
}

/// Fetches crate archives by URL or local path.
#[derive(Debug, Clone)]
pub struct ArchiveAcquirer {
    timeout: Duration,
}

impl Default for ArchiveAcquirer {
    fn default() -> Self {
        Self::from_settings(&DownloadSettings::default())
    }
}

impl ArchiveAcquirer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_settings(settings: &DownloadSettings) -> Self {
        Self::new(Duration::from_secs(settings.timeout_secs))
    }

    /// Makes the crate behind `reference` available in the workspace.
    ///
    /// An existing extraction is reused unless `refresh` is set, in which
    /// case the extraction and its database are removed first. A fresh
    /// extraction always discards the database of the previous one.
    pub fn acquire(
        &self,
        reference: &str,
        workspace: &WorkspaceSettings,
        refresh: bool,
    ) -> Result<Acquired, AppError> {
        let extract_dir = workspace.extract_dir();
        let db_path = workspace.db_path();

        if refresh {
            remove_if_exists(&extract_dir)?;
            remove_if_exists(&db_path)?;
        }

        if extract_dir.exists() {
            tracing::info!("Using existing crate at {}", extract_dir.display());
            return Ok(Acquired {
                extract_dir,
                db_path,
                fetched: false,
            });
        }

        fs::create_dir_all(&workspace.root)?;
        let result = if is_remote(reference) {
            self.download(reference, &workspace.root)
                .and_then(|archive| extract(archive, &extract_dir))
        } else {
            File::open(reference)
                .map_err(AppError::from)
                .and_then(|archive| extract(archive, &extract_dir))
        };

        if let Err(e) = result {
            // Half-extracted folders would be reused on the next call.
            let _ = fs::remove_dir_all(&extract_dir);
            return Err(e);
        }

        // A database left behind belongs to whatever crate was here before.
        remove_if_exists(&db_path)?;

        tracing::info!("Extracted {} into {}", reference, extract_dir.display());
        Ok(Acquired {
            extract_dir,
            db_path,
            fetched: true,
        })
    }

    fn download(&self, url: &str, root: &Path) -> Result<File, AppError> {
        tracing::info!("Downloading {}", url);
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let mut response = client.get(url).send()?.error_for_status()?;

        let mut archive = tempfile::NamedTempFile::new_in(root)?;
        let size = response.copy_to(archive.as_file_mut())?;
        tracing::debug!("Downloaded {} bytes", size);

        let mut file = archive.into_file();
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn extract(archive: File, target: &Path) -> Result<(), AppError> {
    fs::create_dir_all(target)?;
    zip_extract::extract(archive, target, true)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), AppError> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(root: &Path) -> WorkspaceSettings {
        WorkspaceSettings {
            root: root.to_path_buf(),
            ..WorkspaceSettings::default()
        }
    }

    #[test]
    fn test_existing_extraction_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        fs::create_dir_all(ws.extract_dir()).unwrap();

        let acquired = ArchiveAcquirer::default()
            .acquire("https://invalid.example/never-fetched.zip", &ws, false)
            .unwrap();
        assert!(!acquired.fetched);
        assert_eq!(acquired.extract_dir, dir.path().join("rocrate"));
        assert_eq!(acquired.db_path, dir.path().join("rocrate.db"));
    }

    #[test]
    fn test_refresh_removes_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        fs::create_dir_all(ws.extract_dir()).unwrap();
        fs::write(ws.db_path(), b"stale").unwrap();

        let missing = dir.path().join("missing.zip");
        let result =
            ArchiveAcquirer::default().acquire(missing.to_str().unwrap(), &ws, true);

        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(!ws.extract_dir().exists());
        assert!(!ws.db_path().exists());
    }

    /// End-of-central-directory record of a zip archive with no entries.
    const EMPTY_ZIP: [u8; 22] = [
        0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ];

    #[test]
    fn test_fresh_extraction_discards_old_database() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        fs::create_dir_all(&ws.root).unwrap();
        fs::write(ws.db_path(), b"previous corpus").unwrap();
        let archive = dir.path().join("next.zip");
        fs::write(&archive, EMPTY_ZIP).unwrap();

        let acquired = ArchiveAcquirer::default()
            .acquire(archive.to_str().unwrap(), &ws, false)
            .unwrap();

        assert!(acquired.fetched);
        assert!(acquired.extract_dir.is_dir());
        assert!(!acquired.db_path.exists());
    }

    #[test]
    fn test_invalid_archive_leaves_no_folder() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, b"not a zip").unwrap();

        let result = ArchiveAcquirer::default().acquire(bogus.to_str().unwrap(), &ws, false);
        assert!(matches!(result, Err(AppError::Zip(_))));
        assert!(!ws.extract_dir().exists());
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://data.ldaca.edu.au/api/object/meta?id=x"));
        assert!(is_remote("http://localhost/crate.zip"));
        assert!(!is_remote("/tmp/crate.zip"));
        assert!(!is_remote("crate.zip"));
    }
}
