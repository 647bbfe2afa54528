//! Small string key-value store for flags and the session record.
//!
//! When backed by a directory the store lives in `local_storage.json` and
//! every call re-reads the file, so values written by another process are
//! seen on the next call. Nothing here is atomic across processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

const LOCAL_STORAGE_FILE: &str = "local_storage.json";

type Entries = BTreeMap<String, String>;

pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: Mutex<Entries>,
}

impl LocalStorage {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            path: Some(dir.join(LOCAL_STORAGE_FILE)),
            entries: Mutex::new(Entries::new()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Entries::new()),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(false, |entries| entries.get(key).cloned())
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entries(true, |entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    /// Remove a key, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.with_entries(true, |entries| entries.remove(key).is_some())
    }

    fn with_entries<T>(&self, write: bool, f: impl FnOnce(&mut Entries) -> T) -> Result<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(ref path) = self.path {
            *entries = read_entries(path)?;
        }

        let result = f(&mut entries);

        if write {
            if let Some(ref path) = self.path {
                let contents = serde_json::to_string_pretty(&*entries)?;
                std::fs::write(path, contents)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Ok(result)
    }
}

fn read_entries(path: &Path) -> Result<Entries> {
    if !path.exists() {
        return Ok(Entries::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).context("Failed to parse local storage")
}
