//! SQLite-backed key-value store
//!
//! A single `kv` table keyed by TEXT. `BINARY` collation keeps key order
//! identical to byte order, so a prefix scan is a range over the primary key.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::kv::{KvStore, WriteBatch, WriteOp};
use crate::{StoreError, StoreResult};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        log::info!("Opened sqlite store at {}", path.display());
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned { resource: "sqlite connection" })
    }
}

/// Smallest key greater than every key starting with `prefix`, so a prefix
/// scan becomes a primary-key range. `None` means the range is unbounded.
fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        let next = match last {
            '\u{d7ff}' => Some('\u{e000}'),
            c => char::from_u32(c as u32 + 1),
        };
        if let Some(next) = next {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { key, value } => {
                    tx.execute(
                        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
                WriteOp::Delete { key } => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let conn = self.lock()?;
        let upper = prefix_upper_bound(prefix);
        let mut stmt = match upper {
            Some(_) => conn.prepare("SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key")?,
            None => conn.prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")?,
        };
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, Vec<u8>)> {
            Ok((row.get(0)?, row.get(1)?))
        };
        let rows = match &upper {
            Some(upper) => stmt
                .query_map(params![prefix, upper], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![prefix], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    fn count_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = match prefix_upper_bound(prefix) {
            Some(upper) => conn.query_row(
                "SELECT COUNT(*) FROM kv WHERE key >= ?1 AND key < ?2",
                params![prefix, upper],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM kv WHERE key >= ?1",
                params![prefix],
                |row| row.get(0),
            )?,
        };
        Ok(count as usize)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.apply(WriteBatch::new().set("record:1", "first")).unwrap();
        store.apply(WriteBatch::new().set("record:1", "second")).unwrap();
        assert_eq!(store.get("record:1").unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.get("record:2").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.apply(WriteBatch::new().set("category:1", "food")).unwrap();
        store.apply(WriteBatch::new().delete("category:1")).unwrap();
        assert_eq!(store.get("category:1").unwrap(), None);
    }

    #[test]
    fn test_scan_prefix_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .apply(
                WriteBatch::new()
                    .set("record:3", "c")
                    .set("record:1", "a")
                    .set("account:9", "z")
                    .set("record:2", "b"),
            )
            .unwrap();

        let pairs = store.scan_prefix("record:").unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["record:1", "record:2", "record:3"]);
        assert_eq!(pairs[0].1, b"a".to_vec());
        assert_eq!(store.count_prefix("record:").unwrap(), 3);
        assert_eq!(store.count_prefix("category:").unwrap(), 0);
    }

    #[test]
    fn test_prefix_upper_bound() {
        assert_eq!(prefix_upper_bound("record:").as_deref(), Some("record;"));
        assert_eq!(prefix_upper_bound("a\u{10ffff}").as_deref(), Some("b"));
        assert_eq!(prefix_upper_bound(""), None);
    }

    #[test]
    fn test_scan_prefix_excludes_neighbouring_namespaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .apply(
                WriteBatch::new()
                    .set("record", "bare")
                    .set("record:1", "a")
                    .set("record;1", "next")
                    .set("records:1", "other"),
            )
            .unwrap();

        let pairs = store.scan_prefix("record:").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "record:1");
        assert_eq!(store.count_prefix("record:").unwrap(), 1);
        assert_eq!(store.scan_prefix("").unwrap().len(), 4);
    }

    #[test]
    fn test_prefix_with_like_wildcards_is_literal() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .apply(WriteBatch::new().set("a_b:1", "x").set("axb:1", "y"))
            .unwrap();
        assert_eq!(store.scan_prefix("a_b:").unwrap().len(), 1);
    }
}
