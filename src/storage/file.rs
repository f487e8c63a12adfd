use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{ClientStorage, StorageError, StorageKey, StorageResult};

type Entries = BTreeMap<String, String>;

/// Durable storage backed by a single JSON object file
///
/// Every mutation rewrites the whole file through a temporary sibling and an
/// atomic rename, so a crash never leaves a half-written token behind.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: StorageKey) -> StorageResult<Option<String>> {
        let entries = self.load()?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> StorageResult<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: StorageKey) -> StorageResult<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
