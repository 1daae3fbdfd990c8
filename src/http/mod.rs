// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend HTTP Layer
//!
//! [`ApiClient`] wraps `reqwest` with an explicit middleware chain.
//! [`AuthInterceptor`] is the middleware that keeps the session honest: it
//! attaches the bearer token and invalidates the session on 401/419/440.

pub mod client;
pub mod interceptor;

pub use client::{ApiClient, ApiClientBuilder};
pub use interceptor::{is_unauthorized, AuthInterceptor, Middleware, UNAUTHORIZED_CODES};
