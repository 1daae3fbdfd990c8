// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request middleware for the backend client.
//!
//! [`AuthInterceptor`] attaches `Authorization: Bearer <token>` to outgoing
//! requests and treats 401, 419 and 440 responses as proof that the session
//! is gone: the token and identity are cleared before the error reaches the
//! caller. It never issues requests of its own, so an unauthorized response
//! cannot start a retry loop.

use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, warn};

use crate::state::SessionContext;

/// 401 invalid credential, 419 session expired, 440 session timeout.
pub const UNAUTHORIZED_CODES: [u16; 3] = [401, 419, 440];

pub fn is_unauthorized(status: StatusCode) -> bool {
    UNAUTHORIZED_CODES.contains(&status.as_u16())
}

/// Hooks run around every backend call, in the order they were registered.
pub trait Middleware: Send + Sync {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    /// Called once per non-success response, before the error is returned.
    fn on_error_status(&self, _status: StatusCode) {}

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    context: SessionContext,
}

impl AuthInterceptor {
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Apply the unauthorized-status policy.
    ///
    /// Returns `true` when `status` was an unauthorized code.
    pub fn handle_status(&self, status: StatusCode) -> bool {
        if !is_unauthorized(status) {
            return false;
        }

        if self.context.invalidate() {
            warn!(status = status.as_u16(), "backend rejected credentials, session invalidated");
        } else {
            debug!(status = status.as_u16(), "unauthorized response on an empty session");
        }
        true
    }
}

impl Middleware for AuthInterceptor {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.context.tokens.get_token();
        if token.is_empty() {
            request
        } else {
            request.bearer_auth(token)
        }
    }

    fn on_error_status(&self, status: StatusCode) {
        self.handle_status(status);
    }

    fn name(&self) -> &'static str {
        "auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, User};
    use reqwest::header::AUTHORIZATION;

    fn signed_in_context() -> SessionContext {
        let ctx = SessionContext::default();
        ctx.sign_in(
            "tok-123",
            Some(User {
                id: 9,
                email: "a@b.com".to_string(),
                ..User::default()
            }),
        );
        ctx
    }

    #[test]
    fn unauthorized_codes_invalidate_session() {
        for code in UNAUTHORIZED_CODES {
            let ctx = signed_in_context();
            let interceptor = AuthInterceptor::new(ctx.clone());
            let status = StatusCode::from_u16(code).unwrap();

            assert!(interceptor.handle_status(status));
            assert_eq!(ctx.tokens.get_token(), "");
            assert_eq!(ctx.snapshot(), Session::default());
        }
    }

    #[test]
    fn other_codes_leave_session_alone() {
        for code in [400u16, 403, 404, 409, 422, 429, 500, 502, 503] {
            let ctx = signed_in_context();
            let before = ctx.snapshot();
            let interceptor = AuthInterceptor::new(ctx.clone());

            assert!(!interceptor.handle_status(StatusCode::from_u16(code).unwrap()));
            assert_eq!(ctx.tokens.get_token(), "tok-123");
            assert_eq!(ctx.snapshot(), before);
        }
    }

    #[test]
    fn repeated_invalidation_is_harmless() {
        let ctx = signed_in_context();
        let interceptor = AuthInterceptor::new(ctx.clone());
        interceptor.on_error_status(StatusCode::UNAUTHORIZED);
        interceptor.on_error_status(StatusCode::from_u16(440).unwrap());
        assert_eq!(ctx.tokens.get_token(), "");
        assert_eq!(ctx.snapshot(), Session::default());
    }

    #[test]
    fn bearer_header_attached_only_with_token() {
        let client = reqwest::Client::new();
        let ctx = SessionContext::default();
        let interceptor = AuthInterceptor::new(ctx.clone());

        let request = interceptor
            .on_request(client.get("http://localhost/any"))
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());

        ctx.tokens.set_token("tok-123");
        let request = interceptor
            .on_request(client.get("http://localhost/any"))
            .build()
            .unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok-123");
    }
}
