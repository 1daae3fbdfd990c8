// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed-in identity holder.
//!
//! Backed by a `tokio::sync::watch` channel: [`SessionStore::snapshot`] is a
//! plain synchronous read that works with no subscriber alive, and
//! [`SessionStore::subscribe`] lets views react to changes.
//!
//! A signed-out session always carries the empty identity:
//! `set_session_signed_in(false)` resets the user along with the flag, and
//! `set_user` only applies to a signed-in session.

use tokio::sync::watch;
use tracing::debug;

use crate::models::{Session, User};

pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Start with the empty, signed-out session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx }
    }

    /// Replace the identity of a signed-in session.
    ///
    /// Ignored while signed out, so the empty-user rule always holds. Use
    /// [`establish`](Self::establish) to sign in with an identity.
    pub fn set_user(&self, user: User) -> bool {
        self.tx.send_if_modified(|session| {
            if !session.authenticated {
                debug!("identity update ignored on a signed-out session");
                return false;
            }
            if session.user == user {
                return false;
            }
            session.user = user;
            true
        })
    }

    pub fn set_session_signed_in(&self, signed_in: bool) {
        self.tx.send_if_modified(|session| {
            if signed_in {
                let changed = !session.authenticated;
                session.authenticated = true;
                changed
            } else {
                let changed = session.authenticated || !session.user.is_empty();
                session.authenticated = false;
                session.user = User::default();
                changed
            }
        });
    }

    /// Install `user` and mark the session signed in as one change.
    pub fn establish(&self, user: User) {
        self.tx.send_replace(Session {
            authenticated: true,
            user,
        });
    }

    /// Drop back to the empty, signed-out session.
    ///
    /// Returns `false` when the session was already empty.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|session| {
            if *session == Session::default() {
                return false;
            }
            *session = Session::default();
            true
        })
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().authenticated
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.tx.borrow())
            .finish()
    }
}
