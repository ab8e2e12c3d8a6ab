//! Error types for billweb-store

use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    #[error("Search index error: {message}")]
    Index { message: String },

    #[error("Lock poisoned: {resource}")]
    Poisoned { resource: &'static str },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
