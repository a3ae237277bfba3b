//! State store selection.

use super::config::StorageConfig;
use shared_types::{FileBackedKVStore, InMemoryKVStore, KeyValueStore, StoreError};

/// Open the configured store: a state file when a path is set, memory otherwise.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn KeyValueStore>, StoreError> {
    match &config.path {
        Some(path) => {
            tracing::info!("Opening state file {}", path.display());
            Ok(Box::new(FileBackedKVStore::open(path)?))
        }
        None => {
            tracing::warn!("No storage path configured; state is kept in memory");
            Ok(Box::new(InMemoryKVStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            path: Some(dir.path().join("state.bin")),
        };
        {
            let mut store = open_store(&config).unwrap();
            store.put(b"k", b"v").unwrap();
        }
        let store = open_store(&config).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_memory_store() {
        let store = open_store(&StorageConfig::default()).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
