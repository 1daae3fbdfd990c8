// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Data Models
//!
//! Identity, credential and payload types exchanged with the dashboard
//! backend. Field names follow the backend's JSON (`createdAt`,
//! `is_verified`, `logoFileName`).
//!
//! ## Model Categories
//!
//! - **Identity**: [`User`], [`Session`], [`Token`]
//! - **Credentials**: sign-in, sign-up, forgot and reset password bodies
//! - **Onboarding**: [`BusinessDetails`] and the backend's reply
//! - **Results**: [`AuthResult`] returned by every controller operation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::auth::roles::Role;

// =============================================================================
// Identity
// =============================================================================

/// The signed-in user as reported by the backend.
///
/// `User::default()` is the empty identity held while signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
    #[serde(default, rename = "is_verified")]
    pub is_verified: bool,
    #[serde(default)]
    pub role: String,
    /// Role tags checked against a route's required authority set.
    #[serde(default)]
    pub authority: BTreeSet<String>,
}

impl User {
    pub fn is_empty(&self) -> bool {
        *self == User::default()
    }

    /// Authority tags used for route checks.
    ///
    /// Falls back to the user's `role` when the backend sent no `authority`.
    pub fn effective_authority(&self) -> BTreeSet<String> {
        if !self.authority.is_empty() {
            return self.authority.clone();
        }
        Role::from_str(&self.role)
            .map(|role| BTreeSet::from([role.to_string()]))
            .unwrap_or_default()
    }
}

/// Client-side record of whether a user is signed in and who they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub user: User,
}

impl Session {
    pub fn authority(&self) -> BTreeSet<String> {
        self.user.effective_authority()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInCredential {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpCredential {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPassword {
    pub email: String,
}

/// The reset token travels out-of-band (e.g. in the reset link).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPassword {
    pub password: String,
}

/// Body returned by sign-in and sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    #[serde(default)]
    pub user: User,
}

// =============================================================================
// Onboarding
// =============================================================================

/// Business onboarding payload. Built once per submission, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// `data:<mime>;base64,<payload>` URL of the logo image.
    pub logo: String,
    #[serde(rename = "logoFileName")]
    pub logo_file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessDetailsResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub business: Option<Business>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Business {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_asset_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, rename = "teamDetails")]
    pub team_details: Option<TeamDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamDetails {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub team_id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Success,
    Failed,
}

/// Outcome of an [`AuthController`](crate::auth::AuthController) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub status: AuthStatus,
    pub message: String,
}

impl AuthResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Failed,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AuthStatus::Success
    }
}

/// Accepts both `{ ... }` and `{ "data": { ... } }` response bodies.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}
