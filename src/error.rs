// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use reqwest::StatusCode;

pub use crate::storage::StorageError;

/// Message surfaced when the backend cannot be reached.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "Unable to reach the server";

/// Message surfaced when a request exceeds the configured timeout.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Errors produced while talking to the dashboard backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// 401, 419 or 440. The session has already been torn down when this is returned.
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: StatusCode, message: String },

    #[error("backend returned {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("response was invalid: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The message to show the user for this failure.
    pub fn message(&self) -> String {
        match self {
            ClientError::Transport(_) | ClientError::InvalidResponse(_) => {
                GENERIC_TRANSPORT_MESSAGE.to_string()
            }
            ClientError::Timeout => TIMEOUT_MESSAGE.to_string(),
            ClientError::Unauthorized { message, .. } | ClientError::Http { message, .. } => {
                message.clone()
            }
            ClientError::Config(msg) => msg.clone(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Unauthorized { status, .. } | ClientError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
