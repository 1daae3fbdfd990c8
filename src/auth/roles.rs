// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authority tags for route authorization.

use serde::{Deserialize, Serialize};

/// Authority tag carried by administrators.
pub const ADMIN: &str = "ADMIN";
/// Authority tag carried by regular dashboard users.
pub const USER: &str = "USER";

/// Known dashboard roles.
///
/// Routes compare plain authority strings, so unknown tags from the backend
/// still work; this enum only covers the ones the dashboard itself declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal dashboard user
    User,
}

impl Role {
    /// Parse role from string (case-insensitive).
    /// Used when the backend reports a `role` but no `authority` list.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_authority(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN,
            Role::User => USER,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_authority())
    }
}
