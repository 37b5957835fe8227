//! The transport contract required by the controllers.
//!
//! [`Transport`] is the object-safe seam: four verbs over raw JSON text so
//! that server formatting survives until a controller decides what to keep.
//! [`ApiClient`] wraps a shared transport with typed helpers and races every
//! call against a caller-supplied [`CancellationToken`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// A request path below the API base, kept as unencoded segments.
///
/// Segments are percent-encoded by the transport, so IDs containing `/` or
/// spaces address a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiPath {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl ApiPath {
    /// Starts a path below `/auth`.
    #[must_use]
    pub fn auth() -> Self {
        Self {
            segments: vec!["auth".to_string()],
            query: Vec::new(),
        }
    }

    /// Appends a segment.
    #[must_use]
    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The unencoded segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The query parameters, in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// A JSON-over-HTTP client for the lakeFS API.
///
/// Bodies travel as JSON text. An empty response body is returned as an
/// empty string. Implementations must map a 404 to
/// [`ClientError::NotFound`] and must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET path`.
    async fn get(&self, path: &ApiPath) -> Result<String, ClientError>;

    /// `POST path` with an optional JSON body.
    async fn post(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError>;

    /// `PUT path` with an optional JSON body.
    async fn put(&self, path: &ApiPath, body: Option<String>) -> Result<String, ClientError>;

    /// `DELETE path`.
    async fn delete(&self, path: &ApiPath) -> Result<(), ClientError>;
}

/// Shared transport handle.
pub type DynTransport = Arc<dyn Transport>;

/// Typed, cancellable access to a [`Transport`].
#[derive(Clone)]
pub struct ApiClient {
    transport: DynTransport,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wraps a transport.
    #[must_use]
    pub fn new(transport: DynTransport) -> Self {
        Self { transport }
    }

    /// Fetches and decodes `path`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &ApiPath,
    ) -> Result<T, ClientError> {
        tracing::debug!(method = "GET", %path, "lakeFS request");
        let body = guarded(cancel, "GET", path, self.transport.get(path)).await?;
        decode(path, &body)
    }

    /// Posts an optional body and decodes the response.
    pub async fn post<B, T>(
        &self,
        cancel: &CancellationToken,
        path: &ApiPath,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(method = "POST", %path, "lakeFS request");
        let body = encode(path, body)?;
        let response = guarded(cancel, "POST", path, self.transport.post(path, body)).await?;
        decode(path, &response)
    }

    /// Puts an optional body and decodes the response.
    pub async fn put<B, T>(
        &self,
        cancel: &CancellationToken,
        path: &ApiPath,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(method = "PUT", %path, "lakeFS request");
        let body = encode(path, body)?;
        let response = guarded(cancel, "PUT", path, self.transport.put(path, body)).await?;
        decode(path, &response)
    }

    /// Puts an empty body and discards the response.
    pub async fn put_empty(
        &self,
        cancel: &CancellationToken,
        path: &ApiPath,
    ) -> Result<(), ClientError> {
        tracing::debug!(method = "PUT", %path, "lakeFS request");
        guarded(cancel, "PUT", path, self.transport.put(path, None)).await?;
        Ok(())
    }

    /// Deletes `path`.
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        path: &ApiPath,
    ) -> Result<(), ClientError> {
        tracing::debug!(method = "DELETE", %path, "lakeFS request");
        guarded(cancel, "DELETE", path, self.transport.delete(path)).await
    }
}

/// Runs `call` unless `cancel` fires first. Dropping `call` aborts the
/// in-flight exchange.
async fn guarded<T>(
    cancel: &CancellationToken,
    method: &'static str,
    path: &ApiPath,
    call: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(method, %path, "lakeFS request cancelled");
            Err(ClientError::cancelled(method, path.to_string()))
        }
        result = call => result,
    }
}

fn encode<B: Serialize + ?Sized>(
    path: &ApiPath,
    body: Option<&B>,
) -> Result<Option<String>, ClientError> {
    body.map(|b| serde_json::to_string(b))
        .transpose()
        .map_err(|e| ClientError::Encode {
            path: path.to_string(),
            message: e.to_string(),
        })
}

fn decode<T: DeserializeOwned>(path: &ApiPath, body: &str) -> Result<T, ClientError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::decode(path.to_string(), e))
}
