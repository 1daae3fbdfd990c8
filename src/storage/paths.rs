// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the persisted client state layout.

use std::path::{Path, PathBuf};

/// Storage path utilities for the client state directory.
///
/// ```text
/// {root}/
///   local_storage.json        # localStorage strategy
///   cookies.txt               # cookies strategy
///   sessions/{session}.json   # sessionStorage strategy
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key/value file shared by everything using the `localStorage` strategy.
    pub fn local_storage_file(&self) -> PathBuf {
        self.root.join("local_storage.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Key/value file for one session scope.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so a session id can
    /// never escape the sessions directory.
    pub fn session_file(&self, session_id: &str) -> PathBuf {
        let safe: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.sessions_dir().join(format!("{safe}.json"))
    }

    pub fn cookie_jar(&self) -> PathBuf {
        self.root.join("cookies.txt")
    }
}
