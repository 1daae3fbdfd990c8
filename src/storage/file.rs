// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed key/value stores for the `localStorage` and `sessionStorage`
//! strategies.
//!
//! Both keep a flat JSON object of string values in a single file. Writes go
//! to a temp file first and are renamed into place, so a crash mid-write
//! leaves the previous contents intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::{StoragePaths, StorageResult, TokenStorage};

/// JSON object file with atomic replace.
#[derive(Debug)]
struct KeyValueFile {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl KeyValueFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> StorageResult<BTreeMap<String, String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        let map = serde_json::from_reader(BufReader::new(file))?;
        Ok(map)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, map)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.remove(key))
    }

    fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// Persists values across restarts in `{root}/local_storage.json`.
#[derive(Debug)]
pub struct LocalStorage {
    file: KeyValueFile,
}

impl LocalStorage {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            file: KeyValueFile::new(paths.local_storage_file()),
        }
    }
}

impl TokenStorage for LocalStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        self.file.load(key)
    }

    fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        self.file.store(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.file.remove(key)
    }

    fn name(&self) -> &'static str {
        "localStorage"
    }
}

/// Persists values for one session id in `{root}/sessions/{id}.json`.
///
/// Reopening with the same id sees the same values (a page reload); a new
/// id starts empty (a new browser session).
#[derive(Debug)]
pub struct SessionStorage {
    file: KeyValueFile,
}

impl SessionStorage {
    pub fn new(paths: &StoragePaths, session_id: &str) -> Self {
        Self {
            file: KeyValueFile::new(paths.session_file(session_id)),
        }
    }
}

impl TokenStorage for SessionStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        self.file.load(key)
    }

    fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        self.file.store(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.file.remove(key)
    }

    fn name(&self) -> &'static str {
        "sessionStorage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    fn test_paths() -> (tempfile::TempDir, StoragePaths) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = StoragePaths::new(dir.path());
        (dir, paths)
    }

    #[test]
    fn local_storage_round_trips_and_survives_reopen() {
        let (_dir, paths) = test_paths();
        let storage = LocalStorage::new(&paths);
        storage.store("token", "abc").unwrap();
        assert_eq!(storage.load("token").unwrap().as_deref(), Some("abc"));

        let reopened = LocalStorage::new(&paths);
        assert_eq!(reopened.load("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn missing_file_reads_as_absent() {
        let (_dir, paths) = test_paths();
        let storage = LocalStorage::new(&paths);
        assert_eq!(storage.load("token").unwrap(), None);
        storage.remove("token").unwrap();
    }

    #[test]
    fn removing_last_key_deletes_file() {
        let (_dir, paths) = test_paths();
        let storage = LocalStorage::new(&paths);
        storage.store("token", "abc").unwrap();
        assert!(paths.local_storage_file().exists());

        storage.remove("token").unwrap();
        assert!(!paths.local_storage_file().exists());
        assert_eq!(storage.load("token").unwrap(), None);
    }

    #[test]
    fn other_keys_are_preserved() {
        let (_dir, paths) = test_paths();
        let storage = LocalStorage::new(&paths);
        storage.store("theme", "dark").unwrap();
        storage.store("token", "abc").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.load("theme").unwrap().as_deref(), Some("dark"));
        assert!(!paths.root().join("local_storage.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let (_dir, paths) = test_paths();
        fs::write(paths.local_storage_file(), b"{not json").unwrap();
        let storage = LocalStorage::new(&paths);
        assert!(matches!(storage.load("token"), Err(StorageError::Json(_))));
    }

    #[test]
    fn session_storage_is_scoped_by_session_id() {
        let (_dir, paths) = test_paths();
        let first = SessionStorage::new(&paths, "session-a");
        first.store("token", "abc").unwrap();

        let reload = SessionStorage::new(&paths, "session-a");
        assert_eq!(reload.load("token").unwrap().as_deref(), Some("abc"));

        let other = SessionStorage::new(&paths, "session-b");
        assert_eq!(other.load("token").unwrap(), None);
    }
}
