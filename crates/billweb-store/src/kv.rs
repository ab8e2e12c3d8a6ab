//! Key-value store contract
//!
//! Keys are namespaced strings (`record:<n>`, `account:<n>`, ...) and values
//! are opaque bytes. Writes go through a [`WriteBatch`] that a backend must
//! apply atomically.

use crate::StoreResult;

/// A single write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
}

/// Ordered list of writes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a set
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queue a delete
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Consume the batch, yielding operations in insertion order
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Trait for key-value storage backends
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Apply every operation of `batch` atomically
    fn apply(&self, batch: WriteBatch) -> StoreResult<()>;

    /// All pairs whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Number of keys starting with `prefix`
    fn count_prefix(&self, prefix: &str) -> StoreResult<usize> {
        Ok(self.scan_prefix(prefix)?.len())
    }

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_keeps_order() {
        let batch = WriteBatch::new()
            .set("record:1", b"a".to_vec())
            .delete("record:0")
            .set("record:2", "b");

        assert_eq!(batch.len(), 3);
        let ops = batch.into_ops();
        assert_eq!(ops[1], WriteOp::Delete { key: "record:0".to_string() });
        assert_eq!(ops[2], WriteOp::Set { key: "record:2".to_string(), value: b"b".to_vec() });
    }
}
