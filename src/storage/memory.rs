use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ClientStorage, StorageError, StorageKey, StorageResult};

/// In-process storage; contents vanish with the process
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("memory storage lock poisoned".to_string())
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> StorageResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(&key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(StorageKey::AuthToken).unwrap(), None);

        storage.set(StorageKey::AuthToken, "abc").unwrap();
        assert_eq!(
            storage.get(StorageKey::AuthToken).unwrap(),
            Some("abc".to_string())
        );

        storage.remove(StorageKey::AuthToken).unwrap();
        assert_eq!(storage.get(StorageKey::AuthToken).unwrap(), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set(StorageKey::Username, "ada").unwrap();
        assert_eq!(other.get(StorageKey::Username).unwrap(), Some("ada".to_string()));
    }
}
