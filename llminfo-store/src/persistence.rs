//! File persistence helpers.
//!
//! All writes go through [`write_atomic`]: a uniquely named temporary file
//! in the target directory, then a rename. Readers never see a partial file.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::StoreError;

/// Application directory name under the platform config and cache dirs.
const APP_DIR: &str = "llminfo";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - Linux: `~/.config/llminfo`
/// - macOS: `~/Library/Application Support/llminfo`
/// - Windows: `%APPDATA%\llminfo`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

/// Returns the default cache directory.
///
/// - Linux: `~/.cache/llminfo`
/// - macOS: `~/Library/Caches/llminfo`
/// - Windows: `%LOCALAPPDATA%\llminfo`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR).join("cache"))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Returns the default user provider definitions path.
pub fn default_providers_path() -> PathBuf {
    default_config_dir().join("providers.yml")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Ensures a directory exists, creating it owner-only (0700 on Unix).
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_mode(path, 0o700).await?;
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!(
        ".{file_name}.{}.{seq}.{nanos}.tmp",
        std::process::id()
    ))
}

/// Writes `contents` to `path` atomically with owner-only permissions.
///
/// Parent directories are created if missing. Concurrent writers of the
/// same path each use their own temporary file; the last rename wins.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let temp_path = temp_path_for(path);
    tokio::fs::write(&temp_path, contents).await?;
    set_mode(&temp_path, 0o600).await?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = contents.len(), "File written");
    Ok(())
}

/// Saves data to a JSON file atomically.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data)?;
    write_atomic(path, &json).await
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dirs_end_in_app_dir() {
        assert!(default_config_dir().ends_with(APP_DIR));
        assert!(default_settings_path().ends_with("config.json"));
        assert!(default_providers_path().ends_with("providers.yml"));
        assert!(!default_cache_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let target = Path::new("/tmp/x/entry.json");
        let a = temp_path_for(target);
        let b = temp_path_for(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        assert!(a.file_name().unwrap().to_string_lossy().ends_with(".tmp"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_atomic_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("cache");
        let file = dir.join("entry.json");

        write_atomic(&file, b"{}").await.unwrap();

        let file_mode = tokio::fs::metadata(&file).await.unwrap().permissions().mode() & 0o777;
        let dir_mode = tokio::fs::metadata(&dir).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "File should have 0600 permissions");
        assert_eq!(dir_mode, 0o700, "Directory should have 0700 permissions");
    }
}
