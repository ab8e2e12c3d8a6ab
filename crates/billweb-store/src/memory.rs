//! In-process key-value store backed by a `BTreeMap`

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::kv::{KvStore, WriteBatch, WriteOp};
use crate::{StoreError, StoreResult};

/// Volatile store; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Poisoned { resource: "memory store" }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        // Holding the write lock for the whole batch makes it atomic to readers
        let mut data = self.data.write().map_err(poisoned)?;
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.apply(WriteBatch::new().set("account:1", "card")).unwrap();
        assert_eq!(store.get("account:1").unwrap(), Some(b"card".to_vec()));

        store.apply(WriteBatch::new().delete("account:1")).unwrap();
        assert_eq!(store.get("account:1").unwrap(), None);
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store
            .apply(
                WriteBatch::new()
                    .set("record:2", "b")
                    .set("account:1", "x")
                    .set("record:1", "a")
                    .set("recordz", "not a record")
                    .set("zzz", "y"),
            )
            .unwrap();

        let keys: Vec<String> = store
            .scan_prefix("record:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["record:1", "record:2"]);
        assert_eq!(store.count_prefix("account:").unwrap(), 1);
    }

    #[test]
    fn test_later_op_in_batch_wins() {
        let store = MemoryStore::new();
        store
            .apply(WriteBatch::new().set("k", "1").delete("k").set("k", "2"))
            .unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"2".to_vec()));
    }
}
