//! Writing the CSV export to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::api::ApiClient;

/// File name the export is saved under
pub const EXPORT_FILE_NAME: &str = "notes.csv";

/// Directory the export goes to: the configured one, else the user's download
/// directory, else the working directory.
pub fn default_export_dir(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(dirs::download_dir)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve an export target. A directory (existing, or written with a trailing
/// separator) gets `notes.csv` appended; anything else is used as the file path.
pub fn resolve_target(target: &Path) -> PathBuf {
    let looks_like_dir = target.is_dir()
        || target
            .as_os_str()
            .to_str()
            .is_some_and(|s| s.ends_with(std::path::MAIN_SEPARATOR) || s.ends_with('/'));
    if looks_like_dir {
        target.join(EXPORT_FILE_NAME)
    } else {
        target.to_path_buf()
    }
}

/// Write export bytes to `target` (see `resolve_target`), creating parent
/// directories. Returns the file written.
pub fn write_export(target: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let path = resolve_target(target);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Export written");
    Ok(path)
}

/// Download the export and save it
pub async fn export_notes(api: &ApiClient, target: &Path) -> Result<PathBuf> {
    let bytes = api.export_data().await.context("Failed to download export")?;
    write_export(target, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_dir_wins() {
        let dir = Path::new("/srv/exports");
        assert_eq!(default_export_dir(Some(dir)), PathBuf::from("/srv/exports"));
        assert!(!default_export_dir(None).as_os_str().is_empty());
    }

    #[test]
    fn test_write_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_export(dir.path(), b"id,text\n1,hello\n").unwrap();
        assert_eq!(written, dir.path().join(EXPORT_FILE_NAME));
        assert_eq!(std::fs::read(&written).unwrap(), b"id,text\n1,hello\n");
    }

    #[test]
    fn test_write_to_explicit_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("mine.csv");
        let written = write_export(&target, b"x").unwrap();
        assert_eq!(written, target);
        assert!(target.exists());
    }

    #[test]
    fn test_trailing_separator_means_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = format!("{}/fresh/", dir.path().display());
        let written = write_export(Path::new(&target), b"x").unwrap();
        assert_eq!(written.file_name().unwrap(), EXPORT_FILE_NAME);
        assert!(dir.path().join("fresh").join(EXPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_overwrites_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), b"old").unwrap();
        let written = write_export(dir.path(), b"new").unwrap();
        assert_eq!(std::fs::read(written).unwrap(), b"new");
    }
}
