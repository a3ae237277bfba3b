//! # Key-Value Store Port
//!
//! The persistence port used by every subsystem. Each subsystem owns a key
//! prefix and receives the store handle explicitly on every call.
//!
//! Production: `FileBackedKVStore` (below) or a host-provided database.
//! Testing: `InMemoryKVStore` (below).
//!
//! Scans return entries in ascending key order so that anything iterated
//! during block processing (genesis export, validator iteration) is the same
//! on every node.

use crate::entities::Height;
use crate::errors::StoreError;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Abstract interface for key-value database operations.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Per-block execution context handed to hooks and block-scoped operations.
pub struct BlockContext<'a> {
    /// Height of the block being processed.
    pub height: Height,
    /// Store handle for the block's state writes.
    pub store: &'a mut dyn KeyValueStore,
}

impl<'a> BlockContext<'a> {
    pub fn new(height: Height, store: &'a mut dyn KeyValueStore) -> Self {
        Self { height, store }
    }
}

fn apply_batch(data: &mut BTreeMap<Vec<u8>, Vec<u8>>, operations: Vec<BatchOperation>) {
    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                data.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                data.remove(&key);
            }
        }
    }
}

fn scan(data: &BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    data.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// In-memory key-value store for unit tests and ephemeral nodes.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        apply_batch(&mut self.data, operations);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(scan(&self.data, prefix))
    }
}

/// Write buffer over a read-only base store.
///
/// Reads see buffered writes first. Nothing reaches the base until the
/// caller takes [`BufferedStore::into_batch`] and applies it with
/// `atomic_batch_write`; dropping the buffer discards every write.
pub struct BufferedStore<'a> {
    base: &'a dyn KeyValueStore,
    // `None` marks a buffered delete.
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> BufferedStore<'a> {
    pub fn new(base: &'a dyn KeyValueStore) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffered writes as one batch, in key order.
    pub fn into_batch(self) -> Vec<BatchOperation> {
        self.pending
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }
}

impl KeyValueStore for BufferedStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.pending.insert(key, Some(value));
                }
                BatchOperation::Delete { key } => {
                    self.pending.insert(key, None);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

/// File-backed key-value store.
///
/// Keeps the full map in memory and rewrites the file (via a temp file and
/// rename) on every mutation. Suitable for development nodes.
///
/// File format: repeated `[key_len:u32 LE][key][value_len:u32 LE][value]`.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading existing contents if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let data = Self::load_from_file(&path)?;
            tracing::info!(
                "[store] Loaded {} keys from {}",
                data.len(),
                path.display()
            );
            data
        } else {
            tracing::info!("[store] No existing storage file at {}", path.display());
            BTreeMap::new()
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(e: std::io::Error) -> StoreError {
        StoreError::Io {
            message: e.to_string(),
        }
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
        let mut file = std::fs::File::open(path).map_err(Self::io_error)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(Self::io_error)?;

        let truncated = || StoreError::Corrupted {
            key: path.display().to_string(),
            message: "truncated storage file".to_string(),
        };

        let mut data = BTreeMap::new();
        let mut cursor = 0usize;
        let mut read_chunk = |cursor: &mut usize| -> Result<Vec<u8>, StoreError> {
            let len_end = cursor.checked_add(4).ok_or_else(truncated)?;
            let len_bytes: [u8; 4] = bytes
                .get(*cursor..len_end)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(truncated)?;
            let len = u32::from_le_bytes(len_bytes) as usize;
            let end = len_end.checked_add(len).ok_or_else(truncated)?;
            let chunk = bytes.get(len_end..end).ok_or_else(truncated)?.to_vec();
            *cursor = end;
            Ok(chunk)
        };

        while cursor < bytes.len() {
            let key = read_chunk(&mut cursor)?;
            let value = read_chunk(&mut cursor)?;
            data.insert(key, value);
        }

        Ok(data)
    }

    fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(Self::io_error)?;
            }
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(Self::io_error)?;
        file.write_all(&bytes).map_err(Self::io_error)?;
        file.sync_all().map_err(Self::io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(Self::io_error)?;

        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        self.save_to_file()
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        self.save_to_file()
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        apply_batch(&mut self.data, operations);
        self.save_to_file()
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(scan(&self.data, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put(b"key1", b"value1").unwrap();
        store.put(b"key2", b"value2").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);
        assert!(store.exists(b"key1").unwrap());

        store.delete(b"key1").unwrap();
        assert!(!store.exists(b"key1").unwrap());
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let mut store = InMemoryKVStore::new();

        store.put(b"info/c", b"3").unwrap();
        store.put(b"info/a", b"1").unwrap();
        store.put(b"other", b"x").unwrap();
        store.put(b"info/b", b"2").unwrap();

        let keys: Vec<_> = store
            .prefix_scan(b"info/")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"info/a".to_vec(), b"info/b".to_vec(), b"info/c".to_vec()]);
    }

    #[test]
    fn test_batch_write() {
        let mut store = InMemoryKVStore::new();
        store.put(b"gone", b"0").unwrap();

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                BatchOperation::delete(b"gone".to_vec()),
            ])
            .unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!store.exists(b"gone").unwrap());
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");

        {
            let mut store = FileBackedKVStore::open(&path).unwrap();
            store.put(b"epoch", b"5").unwrap();
            store.put(b"params", b"p").unwrap();
            store.delete(b"params").unwrap();
        }

        let reopened = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(reopened.get(b"epoch").unwrap(), Some(b"5".to_vec()));
        assert_eq!(reopened.get(b"params").unwrap(), None);
    }

    #[test]
    fn test_file_backed_store_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        std::fs::write(&path, [5u8, 0, 0, 0, b'a']).unwrap();

        assert!(matches!(
            FileBackedKVStore::open(&path),
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_buffered_store_reads_its_own_writes() {
        let mut base = InMemoryKVStore::new();
        base.put(b"a/1", b"base").unwrap();
        base.put(b"a/2", b"base").unwrap();
        base.put(b"b/1", b"base").unwrap();

        let mut buffer = BufferedStore::new(&base);
        buffer.put(b"a/3", b"new").unwrap();
        buffer.put(b"a/1", b"changed").unwrap();
        buffer.delete(b"a/2").unwrap();

        assert_eq!(buffer.get(b"a/1").unwrap(), Some(b"changed".to_vec()));
        assert!(!buffer.exists(b"a/2").unwrap());
        assert_eq!(
            buffer.prefix_scan(b"a/").unwrap(),
            vec![
                (b"a/1".to_vec(), b"changed".to_vec()),
                (b"a/3".to_vec(), b"new".to_vec()),
            ]
        );
        assert_eq!(buffer.pending_len(), 3);
    }

    #[test]
    fn test_buffered_store_touches_base_only_on_apply() {
        let mut base = InMemoryKVStore::new();
        base.put(b"epoch", b"0").unwrap();

        {
            let mut discarded = BufferedStore::new(&base);
            discarded.put(b"epoch", b"5").unwrap();
        }
        assert_eq!(base.get(b"epoch").unwrap(), Some(b"0".to_vec()));

        let batch = {
            let mut buffer = BufferedStore::new(&base);
            buffer.put(b"epoch", b"5").unwrap();
            buffer.delete(b"missing").unwrap();
            buffer.into_batch()
        };
        base.atomic_batch_write(batch).unwrap();
        assert_eq!(base.get(b"epoch").unwrap(), Some(b"5".to_vec()));
        assert_eq!(base.len(), 1);
    }
}
