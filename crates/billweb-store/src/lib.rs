//! Storage collaborators for billweb
//!
//! Two seams: [`KvStore`] for persistent entities and [`SearchIndex`] for
//! full-text lookup over records. Each has an in-memory implementation; the
//! key-value store also has a SQLite backend.

pub mod error;
pub mod index;
pub mod kv;
pub mod memory;
pub mod memory_index;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use index::{
    BoolMode, DateRange, Document, Query, SearchHit, SearchIndex, SearchRequest, SearchResults,
    SortOrder,
};
pub use kv::{KvStore, WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use memory_index::MemoryIndex;
pub use sqlite::SqliteStore;
