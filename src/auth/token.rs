// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token holder with write-through persistence.
//!
//! The in-memory value is authoritative. Every change is written through to
//! the configured [`TokenStorage`] on a best-effort basis: a failed write is
//! logged and the in-memory value stays in effect for this process.

use std::sync::RwLock;

use tracing::{debug, warn};

use crate::config::{AppConfig, TOKEN_STORAGE_KEY};
use crate::storage::{open_storage, MemoryStorage, StoragePaths, TokenStorage};

/// Holds the current access token. An empty string means "no token".
pub struct TokenStore {
    current: RwLock<String>,
    storage: Box<dyn TokenStorage>,
}

impl TokenStore {
    /// Create a store over `storage`, loading any persisted token.
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        let initial = match storage.load(TOKEN_STORAGE_KEY) {
            Ok(Some(token)) => {
                debug!(storage = storage.name(), "restored persisted access token");
                token
            }
            Ok(None) => String::new(),
            Err(e) => {
                warn!(storage = storage.name(), error = %e, "failed to load persisted token");
                String::new()
            }
        };

        Self {
            current: RwLock::new(initial),
            storage,
        }
    }

    /// Token store that persists nothing.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Open the store for the configured persistence strategy.
    ///
    /// Falls back to in-memory storage when the data directory is unusable.
    pub fn open(config: &AppConfig) -> Self {
        let paths = StoragePaths::new(&config.data_dir);
        match open_storage(
            config.persist_strategy,
            &paths,
            &config.session_id,
            config.cookie_max_age,
        ) {
            Ok(storage) => Self::new(storage),
            Err(e) => {
                warn!(
                    strategy = %config.persist_strategy,
                    data_dir = %config.data_dir.display(),
                    error = %e,
                    "token storage unavailable, keeping token in memory only"
                );
                Self::in_memory()
            }
        }
    }

    pub fn get_token(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_token(&self) -> bool {
        !self
            .current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Replace the token. `""` clears it and removes the persisted entry.
    pub fn set_token(&self, token: &str) {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = token.to_string();
        }

        let result = if token.is_empty() {
            self.storage.remove(TOKEN_STORAGE_KEY)
        } else {
            self.storage.store(TOKEN_STORAGE_KEY, token)
        };

        if let Err(e) = result {
            warn!(
                storage = self.storage.name(),
                error = %e,
                cleared = token.is_empty(),
                "failed to persist access token"
            );
        }
    }

    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("storage", &self.storage.name())
            .field("has_token", &self.has_token())
            .finish()
    }
}
