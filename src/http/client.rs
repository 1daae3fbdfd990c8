// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend HTTP client.
//!
//! Middleware is part of the client's construction, so what happens to every
//! request is visible where the client is built:
//!
//! ```rust,ignore
//! let client = ApiClient::builder(config)
//!     .with_middleware(AuthInterceptor::new(context.clone()))
//!     .build()?;
//! ```

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::interceptor::{is_unauthorized, Middleware};
use crate::config::AppConfig;
use crate::error::ClientError;

/// Error body shapes the backend uses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ApiClientBuilder {
    config: AppConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClientBuilder {
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let http = Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(ApiClient {
            http,
            config: Arc::new(self.config),
            middleware: self.middleware,
        })
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<AppConfig>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClient {
    pub fn builder(config: AppConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            middleware: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// POST `body` as JSON to `endpoint` and decode the JSON reply.
    ///
    /// Non-success statuses run every middleware's error hook once and come
    /// back as [`ClientError::Unauthorized`] or [`ClientError::Http`].
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint_url(endpoint)?;
        let mut request = self.http.post(url).json(body);
        for middleware in &self.middleware {
            request = middleware.on_request(request);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(endpoint = %endpoint, status = status.as_u16(), "backend call completed");

        if !status.is_success() {
            for middleware in &self.middleware {
                middleware.on_error_status(status);
            }
            // The status alone decides the outcome; a broken error body only costs the message.
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) => {
                    debug!(endpoint = %endpoint, error = %e, "failed to read error body");
                    Vec::new()
                }
            };
            let message = error_message(status, &bytes);
            return Err(if is_unauthorized(status) {
                ClientError::Unauthorized { status, message }
            } else {
                ClientError::Http { status, message }
            });
        }

        let bytes = response.bytes().await?;
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload)
            .map_err(|e| ClientError::InvalidResponse(format!("POST {endpoint}: {e}")))
    }
}

/// Prefer the backend's `message`, then `error`, then the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "Request failed with status code {}",
                status.as_u16()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AuthInterceptor;
    use crate::models::{Session, User};
    use crate::state::SessionContext;
    use serde_json::{json, Value};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn config_for(server: &MockServer) -> AppConfig {
        AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        }
    }

    fn client_for(server: &MockServer, ctx: &SessionContext) -> ApiClient {
        ApiClient::builder(config_for(server))
            .with_middleware(AuthInterceptor::new(ctx.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn error_message_prefers_backend_message() {
        let body = br#"{"message":"Invalid credentials","error":"auth"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid credentials"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, br#"{"error":"auth"}"#),
            "auth"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"<html>"),
            "Request failed with status code 502"
        );
    }

    #[tokio::test]
    async fn attaches_bearer_when_token_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = SessionContext::default();
        ctx.tokens.set_token("tok-1");
        let client = client_for(&server, &ctx);

        let reply: Value = client.post_json("/echo", &json!({})).await.unwrap();
        assert_eq!(reply["ok"], true);
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let ctx = SessionContext::default();
        let client = client_for(&server, &ctx);
        let _: Value = client.post_json("/echo", &json!({})).await.unwrap();

        let received: Vec<Request> = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn session_expired_status_clears_state_before_returning() {
        for code in [401u16, 419, 440] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/business"))
                .respond_with(
                    ResponseTemplate::new(code).set_body_json(json!({ "message": "Session expired" })),
                )
                .expect(1)
                .mount(&server)
                .await;

            let ctx = SessionContext::default();
            ctx.sign_in("tok", Some(User { id: 3, ..User::default() }));
            let client = client_for(&server, &ctx);

            let err = client
                .post_json::<_, Value>("/business", &json!({}))
                .await
                .unwrap_err();
            assert!(err.is_unauthorized());
            assert_eq!(err.message(), "Session expired");
            assert_eq!(ctx.tokens.get_token(), "");
            assert_eq!(ctx.snapshot(), Session::default());
        }
    }

    #[tokio::test]
    async fn other_errors_pass_through_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/business"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = SessionContext::default();
        ctx.sign_in("tok", None);
        let client = client_for(&server, &ctx);

        let err = client
            .post_json::<_, Value>("/business", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.message(), "boom");
        assert_eq!(ctx.tokens.get_token(), "tok");
        assert!(ctx.snapshot().authenticated);
    }

    /// Backend that answers one request with `response` verbatim, then keeps
    /// the socket open for `hold` before closing it.
    fn raw_backend(response: &'static str, hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            std::thread::sleep(hold);
        });
        format!("http://{addr}")
    }

    fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    const TRUNCATED_401: &str = "HTTP/1.1 401 Unauthorized\r\n\
        Content-Type: application/json\r\n\
        Content-Length: 100\r\n\r\n{\"mess";

    #[tokio::test]
    async fn unauthorized_status_invalidates_even_when_body_is_cut_short() {
        let ctx = SessionContext::default();
        ctx.sign_in("tok", Some(User { id: 3, ..User::default() }));
        let config = AppConfig {
            api_base_url: raw_backend(TRUNCATED_401, Duration::ZERO),
            ..AppConfig::default()
        };
        let client = ApiClient::builder(config)
            .with_middleware(AuthInterceptor::new(ctx.clone()))
            .build()
            .unwrap();

        let err = client
            .post_json::<_, Value>("/business", &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "Request failed with status code 401");
        assert_eq!(ctx.tokens.get_token(), "");
        assert_eq!(ctx.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn unauthorized_status_invalidates_when_body_stalls() {
        let ctx = SessionContext::default();
        ctx.sign_in("tok", None);
        let config = AppConfig {
            api_base_url: raw_backend(TRUNCATED_401, Duration::from_millis(800)),
            request_timeout: Duration::from_millis(200),
            ..AppConfig::default()
        };
        let client = ApiClient::builder(config)
            .with_middleware(AuthInterceptor::new(ctx.clone()))
            .build()
            .unwrap();

        let err = client
            .post_json::<_, Value>("/business", &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(ctx.tokens.get_token(), "");
        assert!(!ctx.snapshot().authenticated);
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/user/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let ctx = SessionContext::default();
        let client = client_for(&server, &ctx);
        let err = client
            .post_json::<_, Value>("/user/login", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = AppConfig {
            request_timeout: Duration::from_millis(50),
            ..config_for(&server)
        };
        let client = ApiClient::builder(config).build().unwrap();
        let err = client
            .post_json::<_, Value>("/user/login", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }

    #[test]
    fn builder_registers_middleware_in_order() {
        let ctx = SessionContext::default();
        let client = ApiClient::builder(AppConfig::default())
            .with_middleware(AuthInterceptor::new(ctx))
            .build()
            .unwrap();
        assert_eq!(client.middleware_names(), vec!["auth"]);
    }
}
