// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Persistence Module
//!
//! Durable backing stores for the access token. Three interchangeable
//! strategies mirror what a browser offers; the choice changes how long the
//! token survives, never the in-process contract of
//! [`TokenStore`](crate::auth::TokenStore).
//!
//! | Strategy | Backend | Lifetime |
//! |----------|---------|----------|
//! | `localStorage` | [`LocalStorage`] | until removed |
//! | `sessionStorage` | [`SessionStorage`] | one session id |
//! | `cookies` | [`CookieStorage`] | until the cookie expires |
//!
//! [`MemoryStorage`] backs tests and is the fallback when the configured
//! directory cannot be prepared.

use std::io;
use std::time::Duration;

pub mod cookie;
pub mod file;
pub mod memory;
pub mod paths;

pub use cookie::CookieStorage;
pub use file::{LocalStorage, SessionStorage};
pub use memory::MemoryStorage;
pub use paths::StoragePaths;

use crate::config::PersistStrategy;

/// Error type for token persistence.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Backing store cannot be used at all
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "JSON error: {e}"),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            StorageError::Unavailable(_) => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable string key/value store.
pub trait TokenStorage: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    fn store(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the backing store for a persistence strategy.
pub fn open_storage(
    strategy: PersistStrategy,
    paths: &StoragePaths,
    session_id: &str,
    cookie_max_age: Duration,
) -> StorageResult<Box<dyn TokenStorage>> {
    std::fs::create_dir_all(paths.root())?;

    let storage: Box<dyn TokenStorage> = match strategy {
        PersistStrategy::LocalStorage => Box::new(LocalStorage::new(paths)),
        PersistStrategy::SessionStorage => Box::new(SessionStorage::new(paths, session_id)),
        PersistStrategy::Cookies => Box::new(CookieStorage::new(paths, cookie_max_age)),
    };
    Ok(storage)
}
