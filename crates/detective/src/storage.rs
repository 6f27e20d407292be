//! Object Store control-plane REST client.
//!
//! The gateway serves its management API over HTTPS with a self-signed,
//! cluster-internal certificate. The client therefore skips certificate
//! verification: the trust boundary is the cluster network the operator is
//! already diagnosing, and there is no CA to pin against.

use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::validation::outcome::{excerpt, CheckError};

/// Port of the control API.
pub const API_PORT: u16 = 9001;

/// Port of the replication API.
pub const REPLICATION_PORT: u16 = 9000;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const JSON: &str = "application/json";
const INTERNAL_HEADER: &str = "x-rakuten-internal";
const INTERNAL_CALLER: &str = "user";
const TOKEN_HEADER: &str = "x-rakuten-token";

/// Which of the gateway's listeners a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    Api,
    Replication,
}

/// Base URLs of the gateway listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEndpoints {
    pub api: String,
    pub replication: String,
}

impl StorageEndpoints {
    /// HTTPS endpoints for a gateway address (IP or hostname).
    pub fn for_host(host: &str) -> Self {
        Self {
            api: format!("https://{host}:{API_PORT}"),
            replication: format!("https://{host}:{REPLICATION_PORT}"),
        }
    }

    fn base(&self, listener: Listener) -> &str {
        match listener {
            Listener::Api => &self.api,
            Listener::Replication => &self.replication,
        }
    }
}

/// Opaque session credential issued by the gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    password: &'a str,
    username: &'a str,
}

/// HTTP client for the gateway. One instance is built per run and shared by
/// every storage check through a [`StorageSession`].
#[derive(Clone)]
pub struct StorageApi {
    client: Client,
    endpoints: StorageEndpoints,
}

impl StorageApi {
    /// Build the client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(endpoints: StorageEndpoints, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoints })
    }

    fn url(&self, listener: Listener, path: &str) -> String {
        format!("{}{path}", self.endpoints.base(listener))
    }

    /// Exchange the account credentials for a session token.
    ///
    /// The token is returned in the `X-Rakuten-Token` response header.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, CheckError> {
        let url = self.url(Listener::Api, "/user");
        debug!(url = %url, username, "POST login request");

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .header(INTERNAL_HEADER, INTERNAL_CALLER)
            .json(&LoginBody { password, username });

        let response = request
            .send()
            .await
            .map_err(|e| CheckError::transport(&url, e))?;

        let status = response.status();
        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(SessionToken::new);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&url, status, &body));
        }

        token.ok_or_else(|| CheckError::Authentication {
            target: url,
            reason: "header 'X-Rakuten-Token' not found in the response".to_string(),
        })
    }
}

/// An authenticated view of the gateway: the capability every storage check
/// receives. The token is never refreshed during a run.
#[derive(Clone)]
pub struct StorageSession {
    api: StorageApi,
    token: SessionToken,
}

impl StorageSession {
    pub fn new(api: StorageApi, token: SessionToken) -> Self {
        Self { api, token }
    }

    /// GET a path and return the body of a 2xx response.
    pub async fn get(&self, listener: Listener, path: &str) -> Result<Vec<u8>, CheckError> {
        let url = self.api.url(listener, path);
        debug!(url = %url, "GET request");
        self.send(&url, self.api.client.get(&url)).await
    }

    /// Shared request protocol: headers, transport and read errors, status.
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Vec<u8>, CheckError> {
        let response = request
            .header(CONTENT_TYPE, JSON)
            .header(INTERNAL_HEADER, INTERNAL_CALLER)
            .header(TOKEN_HEADER, self.token.expose())
            .send()
            .await
            .map_err(|e| CheckError::transport(url, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            CheckError::transport(url, format!("failed to read response body: {e}"))
        })?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(status_error(url, status, &String::from_utf8_lossy(&body)))
        }
    }
}

fn status_error(url: &str, status: StatusCode, body: &str) -> CheckError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        CheckError::Authentication {
            target: url.to_string(),
            reason: format!("{status}. Body: {}", excerpt(body)),
        }
    } else {
        CheckError::HttpStatus {
            status: status.to_string(),
            body: excerpt(body),
        }
    }
}
