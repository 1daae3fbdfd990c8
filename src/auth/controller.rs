// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication operations.
//!
//! Every operation returns an [`AuthResult`]; transport faults and timeouts
//! become `failed` results with a generic message rather than errors.
//!
//! ## OAuth
//!
//! Provider sign-in is a two-step protocol. [`AuthController::begin_oauth`]
//! registers a pending flow and returns its descriptor; the caller drives the
//! provider and hands the outcome back through
//! [`AuthController::complete_oauth`]. Flows can be cancelled and expire
//! after [`DEFAULT_OAUTH_FLOW_TTL`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, EndpointConfig};
use crate::error::ClientError;
use crate::http::{ApiClient, AuthInterceptor};
use crate::models::{
    AuthResult, BusinessDetails, BusinessDetailsResponse, Envelope, ForgotPassword,
    ResetPassword, SignInCredential, SignInResponse, SignUpCredential, Token, User,
};
use crate::onboarding::validate_business_details;
use crate::state::SessionContext;

pub const DEFAULT_OAUTH_FLOW_TTL: Duration = Duration::from_secs(600);

const MSG_NO_TOKEN: &str = "Sign-in response did not include a token";
const MSG_UNKNOWN_FLOW: &str = "Sign-in flow not found or expired";

/// A pending provider sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthFlow {
    pub state: Uuid,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// What the provider handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthOutcome {
    Granted { token: Token, user: Option<User> },
    Denied { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthCompletion {
    pub result: AuthResult,
    /// Where to navigate next; set only on success.
    pub redirect: Option<String>,
}

pub struct AuthController {
    client: ApiClient,
    context: SessionContext,
    endpoints: EndpointConfig,
    authenticated_entry_path: String,
    oauth_flows: Mutex<HashMap<Uuid, OAuthFlow>>,
    oauth_ttl: Duration,
}

impl AuthController {
    /// Build a controller whose client carries the [`AuthInterceptor`].
    pub fn new(config: AppConfig, context: SessionContext) -> Result<Self, ClientError> {
        let client = ApiClient::builder(config)
            .with_middleware(AuthInterceptor::new(context.clone()))
            .build()?;
        Ok(Self::with_client(client, context))
    }

    pub fn with_client(client: ApiClient, context: SessionContext) -> Self {
        let endpoints = client.config().endpoints.clone();
        let authenticated_entry_path = client.config().authenticated_entry_path.clone();
        Self {
            client,
            context,
            endpoints,
            authenticated_entry_path,
            oauth_flows: Mutex::new(HashMap::new()),
            oauth_ttl: DEFAULT_OAUTH_FLOW_TTL,
        }
    }

    pub fn with_oauth_ttl(mut self, ttl: Duration) -> Self {
        self.oauth_ttl = ttl;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub async fn sign_in(&self, credential: &SignInCredential) -> AuthResult {
        let endpoint = self.endpoints.sign_in.clone();
        self.authenticate(&endpoint, credential).await
    }

    pub async fn sign_up(&self, credential: &SignUpCredential) -> AuthResult {
        let endpoint = self.endpoints.sign_up.clone();
        self.authenticate(&endpoint, credential).await
    }

    async fn authenticate<B: Serialize>(&self, endpoint: &str, body: &B) -> AuthResult {
        let response = self
            .client
            .post_json::<_, Envelope<SignInResponse>>(endpoint, body)
            .await
            .map(Envelope::into_inner);

        match response {
            Ok(SignInResponse { token, .. }) if token.is_empty() => {
                warn!(endpoint = %endpoint, "credential response carried no token");
                AuthResult::failed(MSG_NO_TOKEN)
            }
            Ok(SignInResponse { token, user }) => {
                info!(endpoint = %endpoint, user_id = user.id, "signed in");
                self.context.sign_in(&token, Some(user));
                AuthResult::success("")
            }
            Err(e) => failed(endpoint, e),
        }
    }

    /// Submit onboarding details for the signed-in user.
    ///
    /// Invalid payloads are rejected locally. The session identity is never
    /// touched here; a failed submission leaves the user signed in.
    pub async fn save_business_details(&self, details: &BusinessDetails) -> AuthResult {
        if let Err(errors) = validate_business_details(details) {
            debug!(errors = %errors, "business details rejected before submission");
            return AuthResult::failed(errors.first_message());
        }

        let endpoint = &self.endpoints.save_business_details;
        match self
            .client
            .post_json::<_, Option<Envelope<BusinessDetailsResponse>>>(endpoint, details)
            .await
        {
            Ok(None) => {
                info!("business details saved");
                AuthResult::success("")
            }
            Ok(Some(envelope)) => {
                let response = envelope.into_inner();
                info!(
                    business_id = response.business.as_ref().map(|b| b.id),
                    "business details saved"
                );
                AuthResult::success(response.message)
            }
            Err(e) => failed(endpoint, e),
        }
    }

    pub async fn forgot_password(&self, request: &ForgotPassword) -> AuthResult {
        let endpoint = self.endpoints.forgot_password.clone();
        self.report(&endpoint, request).await
    }

    pub async fn reset_password(&self, request: &ResetPassword) -> AuthResult {
        let endpoint = self.endpoints.reset_password.clone();
        self.report(&endpoint, request).await
    }

    async fn report<B: Serialize>(&self, endpoint: &str, body: &B) -> AuthResult {
        match self.client.post_json::<_, Value>(endpoint, body).await {
            Ok(reply) => {
                let reply = match reply {
                    Value::Object(mut map) => map.remove("data").unwrap_or(Value::Object(map)),
                    other => other,
                };
                let message = reply
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                AuthResult::success(message)
            }
            Err(e) => failed(endpoint, e),
        }
    }

    /// Clear the token and identity.
    ///
    /// The backend is told first when a token is held; its answer does not
    /// matter. Signing out twice sends one request and ends in the same state.
    pub async fn sign_out(&self) {
        if self.context.tokens.has_token() {
            let endpoint = &self.endpoints.sign_out;
            if let Err(e) = self.client.post_json::<_, Value>(endpoint, &json!({})).await {
                debug!(error = %e, "sign-out notification failed");
            }
        }

        if self.context.invalidate() {
            info!("signed out");
        }
    }

    /// Register a provider sign-in and return its descriptor.
    pub fn begin_oauth(&self, provider: &str) -> OAuthFlow {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.oauth_ttl).unwrap_or(chrono::Duration::zero());
        let flow = OAuthFlow {
            state: Uuid::new_v4(),
            provider: provider.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut flows = self.oauth_flows.lock().unwrap_or_else(|e| e.into_inner());
        flows.retain(|_, pending| pending.expires_at > now);
        flows.insert(flow.state, flow.clone());
        debug!(provider = %provider, state = %flow.state, "oauth flow started");
        flow
    }

    /// Discard a pending flow. Returns `false` if it was not pending.
    pub fn cancel_oauth(&self, state: Uuid) -> bool {
        let mut flows = self.oauth_flows.lock().unwrap_or_else(|e| e.into_inner());
        flows.remove(&state).is_some()
    }

    /// Finish a provider sign-in.
    ///
    /// A granted outcome performs the same token and identity write as
    /// [`sign_in`](Self::sign_in) and points the caller at the authenticated
    /// entry path.
    pub fn complete_oauth(&self, state: Uuid, outcome: OAuthOutcome) -> OAuthCompletion {
        let flow = {
            let mut flows = self.oauth_flows.lock().unwrap_or_else(|e| e.into_inner());
            flows.remove(&state)
        };

        let Some(flow) = flow.filter(|flow| flow.expires_at > Utc::now()) else {
            warn!(state = %state, "oauth completion for unknown or expired flow");
            return OAuthCompletion {
                result: AuthResult::failed(MSG_UNKNOWN_FLOW),
                redirect: None,
            };
        };

        match outcome {
            OAuthOutcome::Denied { reason } => {
                info!(provider = %flow.provider, "oauth sign-in denied");
                OAuthCompletion {
                    result: AuthResult::failed(reason),
                    redirect: None,
                }
            }
            OAuthOutcome::Granted { token, .. } if token.access_token.is_empty() => {
                OAuthCompletion {
                    result: AuthResult::failed(MSG_NO_TOKEN),
                    redirect: None,
                }
            }
            OAuthOutcome::Granted { token, user } => {
                info!(provider = %flow.provider, "signed in via oauth");
                self.context.sign_in(&token.access_token, user);
                OAuthCompletion {
                    result: AuthResult::success(""),
                    redirect: Some(self.authenticated_entry_path.clone()),
                }
            }
        }
    }

    pub fn pending_oauth_flows(&self) -> usize {
        self.oauth_flows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

fn failed(endpoint: &str, error: ClientError) -> AuthResult {
    match &error {
        ClientError::Http { .. } | ClientError::Unauthorized { .. } => {
            debug!(endpoint = %endpoint, error = %error, "backend rejected request");
        }
        _ => warn!(endpoint = %endpoint, error = %error, "request failed"),
    }
    AuthResult::failed(error.message())
}
