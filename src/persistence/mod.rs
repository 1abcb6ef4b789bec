//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Backup rotation (tmp → save, old save → backup)
//! - Fallback to defaults on missing or corrupt files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported save version {found} in {path} (expected {expected})")]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl PersistenceError {
    /// True when the file simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        match self {
            PersistenceError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    data: serde_json::Value,
}

fn io_err(path: &Path, source: io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_err(path: &Path, source: serde_json::Error) -> PersistenceError {
    PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Path of the backup written when a save is replaced
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, "bak")
}

/// Read a value wrapped in a versioned envelope
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let json = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let envelope: Envelope = serde_json::from_str(&json).map_err(|e| parse_err(path, e))?;
    if envelope.version != FORMAT_VERSION {
        return Err(PersistenceError::Version {
            path: path.to_path_buf(),
            found: envelope.version,
            expected: FORMAT_VERSION,
        });
    }
    serde_json::from_value(envelope.data).map_err(|e| parse_err(path, e))
}

/// Load a value, or its default when the file is missing or unreadable
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load(path) {
        Ok(value) => value,
        Err(e) if e.is_not_found() => {
            log::info!("No save at {}, starting fresh", path.display());
            T::default()
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            T::default()
        }
    }
}

/// Write a value atomically, keeping the previous file as a backup
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        data: value,
    };
    let json = serde_json::to_string_pretty(&envelope).map_err(|e| parse_err(path, e))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let tmp = sibling(path, "tmp");
    fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup).map_err(|e| io_err(&backup, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    log::debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiki-kaikai-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        dir.join("save.json")
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_file("roundtrip");
        save(&path, &Sample { value: 42 }).unwrap();
        let loaded: Sample = load(&path).unwrap();
        assert_eq!(loaded, Sample { value: 42 });
    }

    #[test]
    fn test_second_save_rotates_backup() {
        let path = temp_file("backup");
        save(&path, &Sample { value: 1 }).unwrap();
        save(&path, &Sample { value: 2 }).unwrap();
        let current: Sample = load(&path).unwrap();
        let previous: Sample = load(&backup_path(&path)).unwrap();
        assert_eq!(current.value, 2);
        assert_eq!(previous.value, 1);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = temp_file("missing");
        let err = load::<Sample>(&path).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(load_or_default::<Sample>(&path), Sample::default());
    }

    #[test]
    fn test_corrupt_and_future_versions_fall_back() {
        let path = temp_file("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, "{ not json").unwrap();
        let result = load::<Sample>(&path);
        assert!(matches!(result, Err(PersistenceError::Parse { .. })));
        assert_eq!(load_or_default::<Sample>(&path), Sample::default());

        fs::write(&path, r#"{"version":99,"data":{"value":5}}"#).unwrap();
        assert!(matches!(
            load::<Sample>(&path),
            Err(PersistenceError::Version { found: 99, .. })
        ));
    }
}
