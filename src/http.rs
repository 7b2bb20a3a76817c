//! Redfish HTTP transport with token or basic authentication
//!
//! The client never interprets status codes. Every call hands back the raw
//! status and body, and the command handlers decide what counts as success.

use crate::config::HttpConfig;
use crate::error::{RedfishError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// How requests authenticate against the controller
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Status code and body of a completed request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            RedfishError::Decode(format!(
                "{} (body: '{}')",
                e,
                self.body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Pass the response through if its status is one of `codes`
    pub fn expect_status(self, codes: &[u16]) -> Result<Self> {
        if codes.contains(&self.status) {
            Ok(self)
        } else {
            Err(RedfishError::UnexpectedStatus {
                status: self.status,
                body: self.body,
            })
        }
    }
}

pub struct HttpClient {
    inner: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpClient {
    /// Client for the controller at `ip`, reached over HTTPS
    pub fn for_controller(ip: &str, credentials: Credentials, cfg: &HttpConfig) -> Result<Self> {
        Self::new(&format!("https://{}", ip), credentials, cfg)
    }

    pub fn new(base_url: &str, credentials: Credentials, cfg: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!cfg.verify_tls)
            .default_headers(headers);

        if let Some(secs) = cfg.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = cfg.connect_timeout {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            inner: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse> {
        self.execute(self.request(Method::GET, path), "GET", path)
            .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<RawResponse> {
        // reqwest's .json() sets Content-Type: application/json
        self.execute(self.request(Method::POST, path).json(body), "POST", path)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<RawResponse> {
        self.execute(self.request(Method::DELETE, path), "DELETE", path)
            .await
    }

    /// Build a request for `path` with exactly one authentication scheme attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.inner.request(method, url);

        match &self.credentials {
            Credentials::Token(token) => builder.header(AUTH_TOKEN_HEADER, token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<RawResponse> {
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        tracing::debug!("{} {} -> {}", method, path, status);

        Ok(RawResponse { status, body })
    }
}
