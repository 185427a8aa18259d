//! The authenticated request gateway.
//!
//! Every authenticated call goes through [Gateway::execute], which runs a
//! fixed pipeline: attach the bearer token, send, then classify and
//! recover. Authorization expiry (401) is recovered transparently at most
//! once per request via a single-flight refresh; a rejected token (403)
//! forces sign-out. The cookie store on the underlying HTTP client
//! carries the long-lived refresh credential, so `/auth/refresh` needs no
//! body.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{response_error, ApiError};
use crate::refresh::{RefreshCoordinator, RefreshFailed, Ticket};
use crate::session::Session;
use crate::types::TokenResponse;

#[derive(Debug)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    refresh: RefreshCoordinator,
}

impl Gateway {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = build_http_client(config)?;
        Ok(Gateway {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            refresh: RefreshCoordinator::new(),
        })
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Builds a request for an API path (leading slash included).
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }

    /// Sends a request through the full pipeline:
    /// attach-auth, send, classify-and-recover.
    ///
    /// Responses other than 401/403 are returned as-is for the endpoint
    /// layer to interpret; 401 is recovered at most once per logical
    /// request, a second 401 on the retry is terminal.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        // Taken before the first send; a request with a streaming body
        // can't be replayed, and is then not retried either.
        let retry_builder = builder.try_clone();

        let response = self.send_with_token(builder).await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                let Some(retry_builder) = retry_builder else {
                    return Err(ApiError::AuthExpired);
                };
                self.refreshed_token().await?;
                let response = self.send_with_token(retry_builder).await?;
                match response.status() {
                    StatusCode::UNAUTHORIZED => Err(ApiError::AuthExpired),
                    StatusCode::FORBIDDEN => self.force_logout(),
                    _ => Ok(response),
                }
            },
            StatusCode::FORBIDDEN => self.force_logout(),
            _ => Ok(response),
        }
    }

    /// Sends a request outside the recovery pipeline. For the public auth
    /// endpoints (login, register) where a 401 means bad credentials, not
    /// an expired token.
    pub(crate) async fn execute_public(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        Ok(builder.send().await?)
    }

    async fn send_with_token(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let builder = match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        Ok(builder.send().await?)
    }

    fn force_logout(&self) -> Result<Response, ApiError> {
        if let Err(err) = self.session.clear() {
            warn!(%err, "failed to clear session after rejected token");
        }
        Err(ApiError::AuthInvalid)
    }

    /// Obtains a fresh access token, coordinating with concurrent callers
    /// so that one expiry event causes exactly one refresh call.
    #[instrument(skip_all)]
    async fn refreshed_token(&self) -> Result<String, ApiError> {
        match self.refresh.join() {
            Ticket::Waiter(receiver) => {
                debug!("refresh already in flight, waiting");
                receiver
                    .await
                    // leader dropped without settling; treat as failed
                    .unwrap_or(Err(RefreshFailed))
                    .map_err(|_| ApiError::AuthExpired)
            },
            Ticket::Leader => {
                debug!("refreshing access token");
                match self.call_refresh_endpoint().await {
                    Ok(token) => {
                        if let Err(err) = self.session.set(token.clone()) {
                            // the in-memory cell is updated regardless;
                            // the next sign-in rewrites the snapshot
                            warn!(%err, "failed to persist refreshed session");
                        }
                        self.refresh.settle(Ok(token.clone()));
                        Ok(token)
                    },
                    Err(err) => {
                        debug!(%err, "token refresh failed, signing out");
                        if let Err(err) = self.session.clear() {
                            warn!(%err, "failed to clear session after refresh failure");
                        }
                        self.refresh.settle(Err(RefreshFailed));
                        Err(ApiError::AuthExpired)
                    },
                }
            },
        }
    }

    /// The actual refresh call. The credential travels in the cookie
    /// store; no bearer token is attached.
    async fn call_refresh_endpoint(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(response_error(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Build the HTTP client: cookie store for the refresh credential, extra
/// headers, user agent and timeouts.
fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, ApiError> {
    let mut headers = HeaderMap::new();
    for (key, value) in &config.extra_headers {
        headers.insert(
            key.parse::<header::HeaderName>()
                .map_err(|e| ApiError::Other(e.to_string()))?,
            HeaderValue::from_str(value).map_err(|e| ApiError::Other(e.to_string()))?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building storefront HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| ApiError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn gateway(url: &str, token: Option<&str>) -> Gateway {
        let config = ClientConfig {
            base_url: url.to_string(),
            ..Default::default()
        };
        let session = Arc::new(Session::ephemeral(token.map(String::from)));
        Gateway::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_token_from_session() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth/me")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(json!({"id": "u1", "email": "a@b.c"}));
        });

        let gateway = gateway(&server.base_url(), Some("tok-1"));
        let response = gateway
            .execute(gateway.request(Method::GET, "/auth/me"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn signed_out_browsing_passes_through() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!({
                "content": [], "totalElements": 0, "totalPages": 0, "size": 12, "number": 0
            }));
        });

        let gateway = gateway(&server.base_url(), None);
        let response = gateway
            .execute(gateway.request(Method::GET, "/products"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn concurrent_expiries_issue_a_single_refresh() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/auth/me")
                .header("authorization", "Bearer stale");
            then.status(401);
        });
        let fresh_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth/me")
                .header("authorization", "Bearer fresh");
            then.status(200).json_body(json!({"id": "u1", "email": "a@b.c"}));
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            // long enough for every caller to expire and queue up
            then.status(200)
                .delay(Duration::from_millis(250))
                .json_body(json!({"accessToken": "fresh"}));
        });

        let gateway = gateway(&server.base_url(), Some("stale"));
        let (a, b, c) = tokio::join!(
            gateway.execute(gateway.request(Method::GET, "/auth/me")),
            gateway.execute(gateway.request(Method::GET, "/auth/me")),
            gateway.execute(gateway.request(Method::GET, "/auth/me")),
        );

        assert_eq!(a.unwrap().status(), StatusCode::OK);
        assert_eq!(b.unwrap().status(), StatusCode::OK);
        assert_eq!(c.unwrap().status(), StatusCode::OK);
        // one refresh for the whole expiry event, every caller retried
        refresh_mock.assert_hits(1);
        fresh_mock.assert_hits(3);
        assert_eq!(gateway.session().token(), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn failed_refresh_signs_out_and_fails_all_callers() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(401);
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(401).delay(Duration::from_millis(250));
        });

        let gateway = gateway(&server.base_url(), Some("stale"));
        let (a, b) = tokio::join!(
            gateway.execute(gateway.request(Method::GET, "/cart")),
            gateway.execute(gateway.request(Method::GET, "/cart")),
        );

        assert!(matches!(a.unwrap_err(), ApiError::AuthExpired));
        assert!(matches!(b.unwrap_err(), ApiError::AuthExpired));
        refresh_mock.assert_hits(1);
        assert_eq!(gateway.session().token(), None);
    }

    #[tokio::test]
    async fn a_request_is_retried_at_most_once() {
        let server = MockServer::start_async().await;
        let protected_mock = server.mock(|when, then| {
            when.method(GET).path("/cart");
            // still 401 after the refresh: the new token is rejected too
            then.status(401);
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(json!({"accessToken": "fresh"}));
        });

        let gateway = gateway(&server.base_url(), Some("stale"));
        let err = gateway
            .execute(gateway.request(Method::GET, "/cart"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::AuthExpired));
        // initial attempt plus exactly one retry
        protected_mock.assert_hits(2);
        refresh_mock.assert_hits(1);
    }

    #[tokio::test]
    async fn forbidden_forces_logout_without_refreshing() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(403);
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(json!({"accessToken": "fresh"}));
        });

        let gateway = gateway(&server.base_url(), Some("revoked"));
        let err = gateway
            .execute(gateway.request(Method::GET, "/cart"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::AuthInvalid));
        refresh_mock.assert_hits(0);
        assert_eq!(gateway.session().token(), None);
    }

    #[tokio::test]
    async fn successive_expiry_events_each_refresh_once() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/cart")
                .header("authorization", "Bearer stale");
            then.status(401);
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/cart")
                .header("authorization", "Bearer fresh");
            then.status(200).json_body(json!({
                "items": [], "total": 0.0, "itemCount": 0
            }));
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(json!({"accessToken": "fresh"}));
        });

        let gateway = gateway(&server.base_url(), Some("stale"));
        gateway
            .execute(gateway.request(Method::GET, "/cart"))
            .await
            .unwrap();
        refresh_mock.assert_hits(1);

        // second expiry event: someone reset the session to a stale token
        gateway.session().set("stale".to_string()).unwrap();
        gateway
            .execute(gateway.request(Method::GET, "/cart"))
            .await
            .unwrap();
        refresh_mock.assert_hits(2);
    }
}
