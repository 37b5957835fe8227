//! [`Transport`] over HTTP with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::ClientError;
use crate::transport::{ApiPath, Transport};

const API_SEGMENTS: [&str; 2] = ["api", "v1"];
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests authenticate against lakeFS.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Access key pair sent as HTTP basic auth.
    Basic {
        access_key_id: String,
        secret_access_key: String,
    },
    /// Session token sent as a bearer token.
    Bearer { token: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { access_key_id, .. } => f
                .debug_struct("Basic")
                .field("access_key_id", access_key_id)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Server root, e.g. `http://localhost:8000`. `/api/v1` is appended.
    pub endpoint: String,
    pub auth: Option<Auth>,
    pub timeout: Duration,
}

impl HttpTransportConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_basic_auth(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.auth = Some(Auth::Basic {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        });
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::Bearer {
            token: token.into(),
        });
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// lakeFS error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP transport for the lakeFS API. Never retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<Auth>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, ClientError> {
        let base_url = api_base(&config.endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            auth: config.auth,
        })
    }

    /// The resolved API base, ending in `/api/v1`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &ApiPath) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidEndpoint(self.base_url.to_string()))?
            .extend(path.segments());
        if !path.query().is_empty() {
            url.query_pairs_mut().extend_pairs(path.query());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        match &self.auth {
            Some(Auth::Basic {
                access_key_id,
                secret_access_key,
            }) => {
                req = req.basic_auth(access_key_id, Some(secret_access_key));
            }
            Some(Auth::Bearer { token }) => {
                req = req.bearer_auth(token);
            }
            None => {}
        }
        req.header("Accept", "application/json")
    }

    async fn send(
        &self,
        method: Method,
        path: &ApiPath,
        body: Option<String>,
    ) -> Result<String, ClientError> {
        let url = self.url(path)?;
        let mut req = self.request(method, url);
        if let Some(body) = body {
            req = req.header("Content-Type", "application/json").body(body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        handle_response(path, resp).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &ApiPath) -> Result<String, ClientError> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError> {
        self.send(Method::POST, path, body).await
    }

    async fn put(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError> {
        self.send(Method::PUT, path, body).await
    }

    async fn delete(&self, path: &ApiPath) -> Result<(), ClientError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}

fn api_base(endpoint: &str) -> Result<Url, ClientError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let mut url =
        Url::parse(trimmed).map_err(|e| ClientError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
    }
    let has_prefix = url.path_segments().is_some_and(|segments| {
        let segments: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
        segments.ends_with(&API_SEGMENTS)
    });
    if !has_prefix {
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidEndpoint(endpoint.to_string()))?
            .pop_if_empty()
            .extend(API_SEGMENTS);
    }
    Ok(url)
}

async fn handle_response(path: &ApiPath, resp: reqwest::Response) -> Result<String, ClientError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::not_found(path.to_string()));
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        return Err(ClientError::http(status.as_u16(), message));
    }
    Ok(body)
}
