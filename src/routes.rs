// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Route Gate
//!
//! Decides, per navigation, whether the current session may enter a route.
//! The decision is a pure function of the session and the route's metadata.
//!
//! ## Rules
//!
//! 1. Guest-only routes (sign-in, sign-up, password recovery) send signed-in
//!    users to the authenticated entry path.
//! 2. A route with no required authority is open to everyone.
//! 3. Otherwise a signed-out session is sent to the unauthenticated entry
//!    path with `?redirectUrl=<requested path>`.
//! 4. A signed-in session enters when its authority set intersects the
//!    route's; if not, it is sent to the access-denied path.

use std::collections::BTreeSet;

use serde::Serialize;
use url::form_urlencoded;

use crate::auth::roles::{ADMIN, USER};
use crate::config::AppConfig;
use crate::models::Session;

/// Query key carrying the originally requested path.
pub const REDIRECT_URL_KEY: &str = "redirectUrl";

pub const ONBOARDING_PREFIX_PATH: &str = "/onboarding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteAccess {
    #[default]
    Default,
    /// Only reachable while signed out.
    GuestOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub key: String,
    pub path: String,
    pub authority: BTreeSet<String>,
    pub access: RouteAccess,
}

impl RouteMeta {
    pub fn new(key: &str, path: &str) -> Self {
        Self {
            key: key.to_string(),
            path: path.to_string(),
            authority: BTreeSet::new(),
            access: RouteAccess::Default,
        }
    }

    pub fn with_authority<I, S>(mut self, authority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authority = authority.into_iter().map(Into::into).collect();
        self
    }

    pub fn guest_only(mut self) -> Self {
        self.access = RouteAccess::GuestOnly;
        self
    }

    pub fn is_public(&self) -> bool {
        self.authority.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum GateDecision {
    Allow,
    Redirect {
        path: String,
        #[serde(rename = "redirectUrl", skip_serializing_if = "Option::is_none")]
        redirect_url: Option<String>,
    },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    /// Full navigation target, including the `redirectUrl` query if any.
    pub fn location(&self) -> Option<String> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Redirect {
                path,
                redirect_url: None,
            } => Some(path.clone()),
            GateDecision::Redirect {
                path,
                redirect_url: Some(target),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(REDIRECT_URL_KEY, target)
                    .finish();
                Some(format!("{path}?{query}"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGate {
    authenticated_entry_path: String,
    unauthenticated_entry_path: String,
    access_denied_path: String,
}

impl RouteGate {
    pub fn new(
        authenticated_entry_path: impl Into<String>,
        unauthenticated_entry_path: impl Into<String>,
        access_denied_path: impl Into<String>,
    ) -> Self {
        Self {
            authenticated_entry_path: authenticated_entry_path.into(),
            unauthenticated_entry_path: unauthenticated_entry_path.into(),
            access_denied_path: access_denied_path.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.authenticated_entry_path.clone(),
            config.unauthenticated_entry_path.clone(),
            config.access_denied_path.clone(),
        )
    }

    pub fn check(&self, session: &Session, route: &RouteMeta) -> GateDecision {
        if route.access == RouteAccess::GuestOnly {
            return if session.authenticated {
                redirect(&self.authenticated_entry_path, None)
            } else {
                GateDecision::Allow
            };
        }

        if route.is_public() {
            return GateDecision::Allow;
        }

        if !session.authenticated {
            return redirect(&self.unauthenticated_entry_path, Some(&route.path));
        }

        if session.authority().is_disjoint(&route.authority) {
            redirect(&self.access_denied_path, None)
        } else {
            GateDecision::Allow
        }
    }
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

fn redirect(path: &str, redirect_url: Option<&str>) -> GateDecision {
    GateDecision::Redirect {
        path: path.to_string(),
        redirect_url: redirect_url.map(str::to_string),
    }
}

/// The dashboard's route metadata.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteMeta>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[RouteMeta] {
        &self.routes
    }

    /// Route whose path matches `path`, ignoring any query or trailing slash.
    pub fn find(&self, path: &str) -> Option<&RouteMeta> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        self.routes.iter().find(|route| route.path == path)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut routes = auth_routes();
        routes.extend(onboarding_routes());
        Self::new(routes)
    }
}

pub fn auth_routes() -> Vec<RouteMeta> {
    vec![
        RouteMeta::new("signIn", "/sign-in").guest_only(),
        RouteMeta::new("signUp", "/sign-up").guest_only(),
        RouteMeta::new("forgotPassword", "/forgot-password").guest_only(),
        RouteMeta::new("resetPassword", "/reset-password").guest_only(),
    ]
}

pub fn onboarding_routes() -> Vec<RouteMeta> {
    vec![RouteMeta::new(
        "onboarding.businessOnboarding",
        &format!("{ONBOARDING_PREFIX_PATH}/business-onboarding"),
    )
    .with_authority([ADMIN, USER])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn signed_in(authority: &[&str]) -> Session {
        Session {
            authenticated: true,
            user: User {
                id: 1,
                authority: authority.iter().map(|a| a.to_string()).collect(),
                ..User::default()
            },
        }
    }

    fn admin_route() -> RouteMeta {
        RouteMeta::new("settings", "/settings").with_authority([ADMIN])
    }

    #[test]
    fn public_route_reachable_regardless_of_session() {
        let gate = RouteGate::default();
        let route = RouteMeta::new("helpCenter", "/help-center");
        assert!(gate.check(&Session::default(), &route).is_allowed());
        assert!(gate.check(&signed_in(&[]), &route).is_allowed());
        assert!(gate.check(&signed_in(&[ADMIN]), &route).is_allowed());
    }

    #[test]
    fn admin_route_requires_admin_authority() {
        let gate = RouteGate::default();
        assert!(gate.check(&signed_in(&[ADMIN]), &admin_route()).is_allowed());
        assert!(gate.check(&signed_in(&[ADMIN, USER]), &admin_route()).is_allowed());

        let denied = gate.check(&signed_in(&[USER]), &admin_route());
        assert_eq!(denied.location().as_deref(), Some("/access-denied"));
    }

    #[test]
    fn signed_out_session_redirected_to_sign_in_with_return_path() {
        let gate = RouteGate::default();
        let decision = gate.check(&Session::default(), &admin_route());
        assert_eq!(
            decision,
            GateDecision::Redirect {
                path: "/sign-in".to_string(),
                redirect_url: Some("/settings".to_string()),
            }
        );
        assert_eq!(
            decision.location().as_deref(),
            Some("/sign-in?redirectUrl=%2Fsettings")
        );
    }

    #[test]
    fn signed_in_users_bounce_off_guest_routes() {
        let gate = RouteGate::default();
        let table = RouteTable::default();
        let sign_in = table.find("/sign-in").unwrap();

        let decision = gate.check(&signed_in(&[USER]), sign_in);
        assert_eq!(decision.location().as_deref(), Some("/dashboards/ecommerce"));
        assert!(gate.check(&Session::default(), sign_in).is_allowed());
    }

    #[test]
    fn role_fallback_grants_authority() {
        let gate = RouteGate::default();
        let session = Session {
            authenticated: true,
            user: User {
                role: "admin".to_string(),
                ..User::default()
            },
        };
        assert!(gate.check(&session, &admin_route()).is_allowed());
    }

    #[test]
    fn onboarding_route_accepts_admin_or_user() {
        let gate = RouteGate::default();
        let table = RouteTable::default();
        let route = table.find("/onboarding/business-onboarding/").unwrap();

        assert!(gate.check(&signed_in(&[USER]), route).is_allowed());
        assert!(gate.check(&signed_in(&[ADMIN]), route).is_allowed());
        assert!(!gate.check(&signed_in(&["SUPPORT"]), route).is_allowed());
        assert!(!gate.check(&Session::default(), route).is_allowed());
    }

    #[test]
    fn find_ignores_query_and_fragment() {
        let table = RouteTable::default();
        assert_eq!(table.find("/sign-up?ref=x").unwrap().key, "signUp");
        assert_eq!(table.find("/reset-password#top").unwrap().key, "resetPassword");
        assert!(table.find("/nowhere").is_none());
    }

    #[test]
    fn custom_entry_paths_are_honoured() {
        let gate = RouteGate::new("/home", "/login", "/403");
        let decision = gate.check(&Session::default(), &admin_route());
        assert_eq!(decision.location().as_deref(), Some("/login?redirectUrl=%2Fsettings"));
        assert_eq!(
            gate.check(&signed_in(&[USER]), &admin_route()).location().as_deref(),
            Some("/403")
        );
    }

    #[test]
    fn decision_serializes_for_cli_output() {
        let value = serde_json::to_value(GateDecision::Allow).unwrap();
        assert_eq!(value, serde_json::json!({ "decision": "allow" }));
    }
}
