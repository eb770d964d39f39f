use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Subdirectory of the data dir that holds one database per channel.
pub const BRAINS_DIR: &str = "brains";

const DB_EXT: &str = "db";
const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm"];

/// Normalize a channel name to its storage key.
///
/// Keys are lowercase and must be usable as a file stem.
pub fn channel_key(channel: &str) -> Result<String, CoreError> {
    let key = channel.trim().trim_start_matches('#').to_lowercase();
    if key.is_empty()
        || key.starts_with('.')
        || key
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(CoreError::InvalidChannel(channel.to_string()));
    }
    Ok(key)
}

pub fn brains_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(BRAINS_DIR)
}

/// `<brains_dir>/<channel>.db`
pub fn brain_db_path(brains_dir: &Path, channel: &str) -> PathBuf {
    brains_dir.join(format!("{channel}.{DB_EXT}"))
}

fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Channels that have a database on disk, sorted. A missing directory is empty.
pub fn list_brain_channels(brains_dir: &Path) -> Result<Vec<String>, CoreError> {
    if !brains_dir.exists() {
        return Ok(Vec::new());
    }
    let mut channels = Vec::new();
    for entry in std::fs::read_dir(brains_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(DB_EXT) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            channels.push(stem.to_string());
        }
    }
    channels.sort();
    Ok(channels)
}

/// Remove a channel's database and its WAL/SHM sidecars.
///
/// Returns false if there was no database to remove.
pub fn remove_brain_files(db_path: &Path) -> Result<bool, CoreError> {
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = sidecar_path(db_path, suffix);
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
        }
    }
    match std::fs::remove_file(db_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Move a database and any sidecars to a new path.
///
/// Refuses to overwrite an existing database at the destination.
pub fn rename_brain_files(from: &Path, to: &Path) -> Result<bool, CoreError> {
    if !from.exists() {
        return Ok(false);
    }
    if to.exists() {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        )));
    }
    std::fs::rename(from, to)?;
    for suffix in SIDECAR_SUFFIXES {
        let old = sidecar_path(from, suffix);
        if old.exists() {
            std::fs::rename(&old, sidecar_path(to, suffix))?;
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_channel_key() {
        assert_eq!(channel_key("#SomeStreamer").unwrap(), "somestreamer");
        assert_eq!(channel_key("  chan ").unwrap(), "chan");
        assert!(channel_key("").is_err());
        assert!(channel_key("../etc").is_err());
        assert!(channel_key("a/b").is_err());
        assert!(channel_key("two words").is_err());
    }

    #[test]
    fn test_list_ignores_sidecars_and_dirs() {
        let tmp = TempDir::new().unwrap();
        let dir = brains_dir(tmp.path());
        assert!(list_brain_channels(&dir).unwrap().is_empty());

        std::fs::create_dir_all(dir.join("nested.db")).unwrap();
        std::fs::write(brain_db_path(&dir, "zeta"), b"").unwrap();
        std::fs::write(brain_db_path(&dir, "alpha"), b"").unwrap();
        std::fs::write(dir.join("alpha.db-wal"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();

        assert_eq!(list_brain_channels(&dir).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_remove_and_rename() {
        let tmp = TempDir::new().unwrap();
        let dir = brains_dir(tmp.path());
        std::fs::create_dir_all(&dir).unwrap();
        let old = brain_db_path(&dir, "old");
        let new = brain_db_path(&dir, "new");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(dir.join("old.db-wal"), b"x").unwrap();

        assert!(rename_brain_files(&old, &new).unwrap());
        assert!(!old.exists());
        assert!(new.exists());
        assert!(dir.join("new.db-wal").exists());
        assert!(!rename_brain_files(&old, &new).unwrap());

        assert!(remove_brain_files(&new).unwrap());
        assert!(!dir.join("new.db-wal").exists());
        assert!(!remove_brain_files(&new).unwrap());
    }

    #[test]
    fn test_rename_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.db");
        let b = tmp.path().join("b.db");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        assert!(rename_brain_files(&a, &b).is_err());
        assert!(a.exists());
    }
}
