// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dashboard Session - client-side authentication state for the admin dashboard
//!
//! Holds the access token and the signed-in identity, attaches the bearer
//! credential to every backend request, invalidates the session when the
//! backend rejects it, and gates navigation on the session's authorities.
//!
//! ## Modules
//!
//! - `auth` - token and session stores, sign-in/sign-up/sign-out operations
//! - `http` - backend client and the auth interceptor
//! - `routes` - route metadata and the navigation gate
//! - `onboarding` - business details validation
//! - `storage` - token persistence strategies

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod onboarding;
pub mod routes;
pub mod state;
pub mod storage;

pub use auth::{AuthController, SessionStore, TokenStore};
pub use config::AppConfig;
pub use error::ClientError;
pub use models::{AuthResult, AuthStatus, Session, User};
pub use routes::{GateDecision, RouteGate, RouteMeta, RouteTable};
pub use state::SessionContext;
