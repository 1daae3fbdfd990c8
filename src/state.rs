// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{SessionStore, TokenStore};
use crate::config::AppConfig;
use crate::models::{Session, User};

/// Shared session state handed to every component that reads or changes it.
///
/// Cloning is cheap; clones share the same stores.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub tokens: Arc<TokenStore>,
    pub session: Arc<SessionStore>,
}

impl SessionContext {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens: Arc::new(tokens),
            session: Arc::new(SessionStore::new()),
        }
    }

    /// Context whose token store follows the configured persistence strategy.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(TokenStore::open(config))
    }

    /// Record a successful sign-in.
    pub fn sign_in(&self, token: &str, user: Option<User>) {
        self.tokens.set_token(token);
        match user {
            Some(user) => self.session.establish(user),
            None => self.session.set_session_signed_in(true),
        }
    }

    /// Clear the token and the identity.
    ///
    /// Returns `true` if there was anything to clear.
    pub fn invalidate(&self) -> bool {
        let had_token = self.tokens.has_token();
        if had_token {
            self.tokens.set_token("");
        }
        let had_session = self.session.reset();
        had_token || had_session
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(TokenStore::in_memory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_writes_both_stores() {
        let ctx = SessionContext::default();
        let user = User {
            email: "a@b.com".to_string(),
            ..User::default()
        };
        ctx.sign_in("tok", Some(user.clone()));

        assert_eq!(ctx.tokens.get_token(), "tok");
        let session = ctx.snapshot();
        assert!(session.authenticated);
        assert_eq!(session.user, user);
    }

    #[test]
    fn sign_in_without_user_keeps_identity() {
        let ctx = SessionContext::default();
        ctx.sign_in("tok", None);
        assert!(ctx.snapshot().authenticated);
        assert!(ctx.snapshot().user.is_empty());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let ctx = SessionContext::default();
        ctx.sign_in("tok", None);

        assert!(ctx.invalidate());
        let once = (ctx.tokens.get_token(), ctx.snapshot());
        assert!(!ctx.invalidate());
        let twice = (ctx.tokens.get_token(), ctx.snapshot());

        assert_eq!(once, twice);
        assert_eq!(once.0, "");
        assert_eq!(once.1, Session::default());
    }

    #[test]
    fn clones_share_state() {
        let ctx = SessionContext::default();
        let other = ctx.clone();
        ctx.sign_in("tok", None);
        assert_eq!(other.tokens.get_token(), "tok");
        assert!(other.session.is_authenticated());
    }
}
