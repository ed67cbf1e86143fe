//! Durable key-value slot holding serialized contact lists.

#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[cfg(test)]
    #[error("storage is read-only")]
    ReadOnly,
}

/// Persistent string-keyed storage.
pub trait Slot {
    /// Stored text for `key`, or `None` if nothing was ever saved.
    fn load(&self, key: &str) -> Result<Option<String>, SlotError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, SlotError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Slot for FileSlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SlotError::Io {
                action: "read",
                path,
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path_for(key)?;
        write_atomic(&path, value.as_bytes())
    }
}

fn validate_key(key: &str) -> Result<(), SlotError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(SlotError::InvalidKey(key.to_string()))
    }
}

/// Write to a sibling temp file, fsync, then rename over the target.
pub fn write_atomic(target: &Path, data: &[u8]) -> Result<(), SlotError> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| SlotError::Io {
        action: "create directory",
        path: parent.to_path_buf(),
        source,
    })?;

    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("agenda");
    let mut counter: u32 = 0;
    let temp_path = loop {
        let candidate = if counter == 0 {
            parent.join(format!(".{file_name}.tmp"))
        } else {
            parent.join(format!(".{file_name}.{counter}.tmp"))
        };
        if !candidate.exists() {
            break candidate;
        }
        counter += 1;
    };

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|source| SlotError::Io {
                action: "create temporary file",
                path: temp_path.clone(),
                source,
            })?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(|source| SlotError::Io {
                action: "write temporary file",
                path: temp_path.clone(),
                source,
            })?;
    }

    if let Err(source) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(SlotError::Io {
            action: "replace",
            path: target.to_path_buf(),
            source,
        });
    }

    if let Ok(dir_file) = fs::File::open(parent) {
        let _ = dir_file.sync_all();
    }

    Ok(())
}

/// Slot kept entirely in memory.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
    read_only: bool,
}

#[cfg(test)]
impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut slot = Self::new();
        slot.entries.insert(key.to_string(), value.to_string());
        slot
    }

    /// Make every subsequent `save` fail.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl Slot for MemorySlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        if self.read_only {
            return Err(SlotError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
