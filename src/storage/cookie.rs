// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie-jar backed storage for the `cookies` strategy.
//!
//! The jar uses the Netscape `cookies.txt` layout so it can be inspected or
//! imported by other HTTP tooling:
//!
//! ```text
//! # Netscape HTTP Cookie File
//! localhost	FALSE	/	FALSE	1792310400	token	eyJhbGciOi...
//! ```
//!
//! Values are form-urlencoded. Cookies past their expiry read as absent and
//! are dropped on the next write.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use url::form_urlencoded;

use super::{StoragePaths, StorageResult, TokenStorage};

const JAR_HEADER: &str = "# Netscape HTTP Cookie File";
const COOKIE_DOMAIN: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CookieLine {
    name: String,
    value: String,
    expires_at: i64,
}

impl CookieLine {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return None;
        }
        let expires_at = fields[4].parse().ok()?;
        let value = form_urlencoded::parse(fields[6].as_bytes())
            .next()
            .map(|(decoded, _)| decoded.into_owned())
            .unwrap_or_default();
        Some(Self {
            name: fields[5].to_string(),
            value,
            expires_at,
        })
    }

    fn render(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.value.as_bytes()).collect();
        format!(
            "{COOKIE_DOMAIN}\tFALSE\t/\tFALSE\t{}\t{}\t{}",
            self.expires_at, self.name, encoded
        )
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Stores each key as a cookie with a fixed max-age.
#[derive(Debug)]
pub struct CookieStorage {
    jar: PathBuf,
    max_age: Duration,
    lock: Mutex<()>,
}

impl CookieStorage {
    pub fn new(paths: &StoragePaths, max_age: Duration) -> Self {
        Self {
            jar: paths.cookie_jar(),
            max_age,
            lock: Mutex::new(()),
        }
    }

    fn read_live(&self, now: i64) -> StorageResult<Vec<CookieLine>> {
        let contents = match fs::read_to_string(&self.jar) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(contents
            .lines()
            .filter_map(CookieLine::parse)
            .filter(|cookie| !cookie.is_expired(now))
            .collect())
    }

    fn write_all(&self, cookies: &[CookieLine]) -> StorageResult<()> {
        if cookies.is_empty() {
            return match fs::remove_file(&self.jar) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.jar.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.jar.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            writeln!(writer, "{JAR_HEADER}")?;
            for cookie in cookies {
                writeln!(writer, "{}", cookie.render())?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &self.jar)?;
        Ok(())
    }
}

impl TokenStorage for CookieStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().timestamp();
        Ok(self
            .read_live(now)?
            .into_iter()
            .find(|cookie| cookie.name == key)
            .map(|cookie| cookie.value))
    }

    fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().timestamp();
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let mut cookies = self.read_live(now)?;
        cookies.retain(|cookie| cookie.name != key);
        cookies.push(CookieLine {
            name: key.to_string(),
            value: value.to_string(),
            expires_at: now.saturating_add(max_age),
        });
        self.write_all(&cookies)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().timestamp();
        let mut cookies = self.read_live(now)?;
        cookies.retain(|cookie| cookie.name != key);
        self.write_all(&cookies)
    }

    fn name(&self) -> &'static str {
        "cookies"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage(max_age: Duration) -> (tempfile::TempDir, StoragePaths, CookieStorage) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = StoragePaths::new(dir.path());
        let storage = CookieStorage::new(&paths, max_age);
        (dir, paths, storage)
    }

    #[test]
    fn store_and_load_cookie() {
        let (_dir, paths, storage) = test_storage(Duration::from_secs(3600));
        storage.store("token", "a+b=c d").unwrap();
        assert_eq!(storage.load("token").unwrap().as_deref(), Some("a+b=c d"));

        let jar = fs::read_to_string(paths.cookie_jar()).unwrap();
        assert!(jar.starts_with(JAR_HEADER));
        assert!(jar.contains("\ttoken\ta%2Bb%3Dc+d"));
    }

    #[test]
    fn expired_cookie_reads_as_absent() {
        let (_dir, _paths, storage) = test_storage(Duration::from_secs(0));
        storage.store("token", "abc").unwrap();
        assert_eq!(storage.load("token").unwrap(), None);
    }

    #[test]
    fn huge_max_age_never_expires() {
        let (_dir, _paths, storage) = test_storage(Duration::from_secs(u64::MAX));
        storage.store("token", "abc").unwrap();
        assert_eq!(storage.load("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn remove_drops_the_cookie_and_jar() {
        let (_dir, paths, storage) = test_storage(Duration::from_secs(3600));
        storage.store("token", "abc").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.load("token").unwrap(), None);
        assert!(!paths.cookie_jar().exists());
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let (_dir, paths, storage) = test_storage(Duration::from_secs(3600));
        storage.store("token", "first").unwrap();
        storage.store("token", "second").unwrap();
        assert_eq!(storage.load("token").unwrap().as_deref(), Some("second"));

        let jar = fs::read_to_string(paths.cookie_jar()).unwrap();
        assert_eq!(jar.lines().filter(|l| l.contains("\ttoken\t")).count(), 1);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let (_dir, paths, storage) = test_storage(Duration::from_secs(3600));
        let far_future = Utc::now().timestamp() + 10_000;
        fs::write(
            paths.cookie_jar(),
            format!("{JAR_HEADER}\ngarbage line\nlocalhost\tFALSE\t/\tFALSE\t{far_future}\ttoken\txyz\n"),
        )
        .unwrap();
        assert_eq!(storage.load("token").unwrap().as_deref(), Some("xyz"));
    }
}
