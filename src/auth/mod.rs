// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication State
//!
//! Client-side half of the dashboard's authentication.
//!
//! ## Flow
//!
//! 1. [`AuthController`] posts credentials and receives `{ token, user }`
//! 2. The token goes to [`TokenStore`], which writes it through to the
//!    configured persistence strategy
//! 3. The identity goes to [`SessionStore`], which publishes every change to
//!    its subscribers
//! 4. Every backend call carries `Authorization: Bearer <token>` until the
//!    backend answers 401/419/440, at which point both stores are cleared
//!
//! ## Invariants
//!
//! - An empty token means "no token"; nothing empty is ever persisted
//! - A signed-out session always holds the empty user

pub mod controller;
pub mod roles;
pub mod session;
pub mod token;

pub use controller::{AuthController, OAuthCompletion, OAuthFlow, OAuthOutcome};
pub use roles::Role;
pub use session::SessionStore;
pub use token::TokenStore;
