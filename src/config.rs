// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the client. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `API_BASE_URL` | Backend origin | `https://api.3themind.com/v1` |
//! | `API_PREFIX` | Path prefix placed before every endpoint | `/api` |
//! | `AUTHENTICATED_ENTRY_PATH` | Landing path for signed-in users | `/dashboards/ecommerce` |
//! | `UNAUTHENTICATED_ENTRY_PATH` | Landing path for signed-out users | `/sign-in` |
//! | `ACCESS_DENIED_PATH` | Landing path on authority mismatch | `/access-denied` |
//! | `ACCESS_TOKEN_PERSIST_STRATEGY` | `localStorage`, `sessionStorage` or `cookies` | `localStorage` |
//! | `DATA_DIR` | Root directory for persisted client state | `$TMPDIR/dashboard-session` |
//! | `SESSION_ID` | Scope of the `sessionStorage` strategy | random per process |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout | `15` |
//! | `TOKEN_COOKIE_MAX_AGE_SECS` | Lifetime of the token cookie | `86400` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,dashboard_session=debug` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::ClientError;

pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
pub const API_PREFIX_ENV: &str = "API_PREFIX";
pub const AUTHENTICATED_ENTRY_PATH_ENV: &str = "AUTHENTICATED_ENTRY_PATH";
pub const UNAUTHENTICATED_ENTRY_PATH_ENV: &str = "UNAUTHENTICATED_ENTRY_PATH";
pub const ACCESS_DENIED_PATH_ENV: &str = "ACCESS_DENIED_PATH";
pub const PERSIST_STRATEGY_ENV: &str = "ACCESS_TOKEN_PERSIST_STRATEGY";

/// Environment variable name for the persisted client state directory.
///
/// Holds `local_storage.json`, `cookies.txt` and the `sessions/` directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const SESSION_ID_ENV: &str = "SESSION_ID";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const COOKIE_MAX_AGE_ENV: &str = "TOKEN_COOKIE_MAX_AGE_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_BASE_URL: &str = "https://api.3themind.com/v1";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_AUTHENTICATED_ENTRY_PATH: &str = "/dashboards/ecommerce";
pub const DEFAULT_UNAUTHENTICATED_ENTRY_PATH: &str = "/sign-in";
pub const DEFAULT_ACCESS_DENIED_PATH: &str = "/access-denied";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Key under which the access token is persisted.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Where the access token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistStrategy {
    /// Survives restarts.
    #[default]
    LocalStorage,
    /// Scoped to one session id; a new session starts without a token.
    SessionStorage,
    /// Cookie jar file with an expiry.
    Cookies,
}

impl FromStr for PersistStrategy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "localStorage" | "local" => Ok(PersistStrategy::LocalStorage),
            "sessionStorage" | "session" => Ok(PersistStrategy::SessionStorage),
            "cookies" | "cookie" => Ok(PersistStrategy::Cookies),
            other => Err(ClientError::Config(format!(
                "unknown token persist strategy '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for PersistStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistStrategy::LocalStorage => write!(f, "localStorage"),
            PersistStrategy::SessionStorage => write!(f, "sessionStorage"),
            PersistStrategy::Cookies => write!(f, "cookies"),
        }
    }
}

/// Backend endpoint paths, relative to `api_base_url` + `api_prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub sign_in: String,
    pub sign_out: String,
    pub sign_up: String,
    pub forgot_password: String,
    pub reset_password: String,
    pub save_business_details: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            sign_in: "/user/login".to_string(),
            sign_out: "/user/logout".to_string(),
            sign_up: "/user/register".to_string(),
            forgot_password: "/user/forgot-password".to_string(),
            reset_password: "/user/reset-password".to_string(),
            save_business_details: "/business".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_prefix: String,
    pub authenticated_entry_path: String,
    pub unauthenticated_entry_path: String,
    pub access_denied_path: String,
    pub persist_strategy: PersistStrategy,
    pub data_dir: PathBuf,
    pub session_id: String,
    pub request_timeout: Duration,
    pub cookie_max_age: Duration,
    pub endpoints: EndpointConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            authenticated_entry_path: DEFAULT_AUTHENTICATED_ENTRY_PATH.to_string(),
            unauthenticated_entry_path: DEFAULT_UNAUTHENTICATED_ENTRY_PATH.to_string(),
            access_denied_path: DEFAULT_ACCESS_DENIED_PATH.to_string(),
            persist_strategy: PersistStrategy::default(),
            data_dir: default_data_dir(),
            session_id: Uuid::new_v4().to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cookie_max_age: DEFAULT_COOKIE_MAX_AGE,
            endpoints: EndpointConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let api_base_url = match env::var(API_BASE_URL_ENV) {
            Ok(raw) => {
                Url::parse(raw.trim())
                    .map_err(|e| ClientError::Config(format!("{API_BASE_URL_ENV}: {e}")))?;
                raw.trim().to_string()
            }
            Err(_) => defaults.api_base_url,
        };

        let persist_strategy = match env::var(PERSIST_STRATEGY_ENV) {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.persist_strategy,
        };

        Ok(Self {
            api_base_url,
            api_prefix: env_or_default(API_PREFIX_ENV, DEFAULT_API_PREFIX),
            authenticated_entry_path: env_or_default(
                AUTHENTICATED_ENTRY_PATH_ENV,
                DEFAULT_AUTHENTICATED_ENTRY_PATH,
            ),
            unauthenticated_entry_path: env_or_default(
                UNAUTHENTICATED_ENTRY_PATH_ENV,
                DEFAULT_UNAUTHENTICATED_ENTRY_PATH,
            ),
            access_denied_path: env_or_default(ACCESS_DENIED_PATH_ENV, DEFAULT_ACCESS_DENIED_PATH),
            persist_strategy,
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            session_id: env::var(SESSION_ID_ENV).unwrap_or(defaults.session_id),
            request_timeout: env_secs(REQUEST_TIMEOUT_ENV)?.unwrap_or(defaults.request_timeout),
            cookie_max_age: env_secs(COOKIE_MAX_AGE_ENV)?.unwrap_or(defaults.cookie_max_age),
            endpoints: defaults.endpoints,
        })
    }

    /// Absolute URL for an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}{}{}",
            self.api_base_url.trim_end_matches('/'),
            normalize_segment(&self.api_prefix),
            normalize_segment(path),
        );
        Url::parse(&joined).map_err(|e| ClientError::Config(format!("bad endpoint '{path}': {e}")))
    }
}

fn normalize_segment(segment: &str) -> String {
    let trimmed = segment.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn default_data_dir() -> PathBuf {
    env::temp_dir().join("dashboard-session")
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_secs(key: &str) -> Result<Option<Duration>, ClientError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| ClientError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}
