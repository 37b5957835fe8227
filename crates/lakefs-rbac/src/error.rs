//! Error types for the lakeFS auth API client and the resource controllers.
//!
//! Two layers are kept apart:
//! - [`ClientError`] is raised by a [`Transport`](crate::transport::Transport)
//!   and describes what happened to a single HTTP exchange.
//! - [`ResourceError`] is raised by a controller and describes which lifecycle
//!   step failed for which resource, carrying the transport cause.

use std::fmt;

/// Errors raised by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The remote service reported that the addressed object does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The request path that returned 404.
        path: String,
    },

    /// The remote service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body when none was present.
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode {
        /// The request path.
        path: String,
        /// Decoder error text.
        message: String,
    },

    /// A request body could not be serialised.
    #[error("failed to encode request to {path}: {message}")]
    Encode {
        /// The request path.
        path: String,
        /// Encoder error text.
        message: String,
    },

    /// The caller cancelled the operation while the request was in flight.
    #[error("request cancelled: {method} {path}")]
    Cancelled {
        /// HTTP method of the aborted request.
        method: &'static str,
        /// The request path.
        path: String,
    },

    /// The configured endpoint is not a usable base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ClientError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a new `Http` error.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a new `Cancelled` error.
    #[must_use]
    pub fn cancelled(method: &'static str, path: impl Into<String>) -> Self {
        Self::Cancelled {
            method,
            path: path.into(),
        }
    }

    /// Returns `true` if the remote service reported the object as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the request was aborted by the caller.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Http { status, .. } if *status < 500 => ErrorCategory::Rejected,
            Self::Http { .. } => ErrorCategory::Server,
            Self::Network(_) => ErrorCategory::Network,
            Self::Decode { .. } | Self::Encode { .. } => ErrorCategory::Protocol,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::InvalidEndpoint(_) => ErrorCategory::Configuration,
        }
    }
}

/// Categories of client errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Object absent on the remote side.
    NotFound,
    /// 4xx other than 404.
    Rejected,
    /// 5xx.
    Server,
    /// Connection level failure.
    Network,
    /// Unexpected response shape.
    Protocol,
    /// Caller cancelled.
    Cancelled,
    /// Bad local configuration.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Rejected => write!(f, "rejected"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::Protocol => write!(f, "protocol"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Errors raised by resource controllers, data sources and the reconciler.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A remote call failed. `action` reads like "create user" or
    /// "attach policy p1 to group g1".
    #[error("Unable to {action}: {source}")]
    Client {
        /// What the controller was trying to do.
        action: String,
        /// Underlying transport failure.
        #[source]
        source: ClientError,
    },

    /// A server-returned policy statement could not be turned back into text.
    #[error("Unable to marshal policy statement: {0}")]
    MarshalStatement(#[source] serde_json::Error),

    /// A desired policy statement is not JSON and cannot be sent.
    #[error("Policy statement is not valid JSON: {0}")]
    InvalidStatement(#[source] serde_json::Error),

    /// An import identifier did not have the expected shape.
    #[error("Invalid import identifier {id:?}: expected {expected}")]
    InvalidImportId {
        /// The identifier as given.
        id: String,
        /// Human description of the accepted format.
        expected: &'static str,
    },

    /// State lacks an identity field required to address the remote object.
    #[error("{kind} state has no {field}; it cannot be addressed remotely")]
    MissingIdentity {
        /// Resource kind name.
        kind: &'static str,
        /// The missing field.
        field: &'static str,
    },

    /// A replacement deleted the old object but creating the new one failed.
    /// The instance no longer exists remotely.
    #[error("Replacement incomplete, the old object was deleted: {source}")]
    ReplaceIncomplete {
        /// Why the create step failed.
        #[source]
        source: Box<ResourceError>,
    },

    /// Desired and prior state belong to different resource kinds.
    #[error("resource kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Kind of the first operand.
        expected: &'static str,
        /// Kind of the second operand.
        actual: &'static str,
    },
}

impl ResourceError {
    /// Wraps a transport failure with the action that was being attempted.
    #[must_use]
    pub fn client(action: impl Into<String>, source: ClientError) -> Self {
        Self::Client {
            action: action.into(),
            source,
        }
    }

    /// Creates a new `InvalidImportId` error.
    #[must_use]
    pub fn invalid_import_id(id: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidImportId {
            id: id.into(),
            expected,
        }
    }

    /// Returns the transport cause, if any.
    #[must_use]
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client { source, .. } => Some(source),
            Self::ReplaceIncomplete { source } => source.client_error(),
            _ => None,
        }
    }

    /// Returns `true` if the failed operation left the instance absent
    /// remotely, so its prior record must be dropped.
    #[must_use]
    pub fn left_absent(&self) -> bool {
        matches!(self, Self::ReplaceIncomplete { .. })
    }

    /// Returns `true` if the transport cause was a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.client_error().is_some_and(ClientError::is_not_found)
    }

    /// Short diagnostic title, paired with the `Display` text as detail.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Client { .. } => "Client Error",
            Self::MarshalStatement(_) => "Marshal Error",
            Self::InvalidStatement(_) => "Invalid Statement",
            Self::InvalidImportId { .. } => "Import Error",
            Self::MissingIdentity { .. } => "State Error",
            Self::ReplaceIncomplete { .. } => "Replace Error",
            Self::KindMismatch { .. } => "Plan Error",
        }
    }
}

/// Result alias for controller operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
