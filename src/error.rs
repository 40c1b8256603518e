// src/error.rs
//! Application error types with structured error handling.
//!
//! Two layers live here. `AppError` records what went wrong on the wire
//! (transport, status, body). `NotionApiError` is the classified taxonomy
//! every caller above the API wrapper sees: not found, invalid request,
//! server, permission, client, and the catch-all "not handled".

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded; back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request is malformed in some other way
    InvalidRequest,
    /// Request URL is malformed
    InvalidRequestUrl,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// Upstream did not answer in time
    GatewayTimeout,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "invalid_request" => Self::InvalidRequest,
            "invalid_request_url" => Self::InvalidRequestUrl,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            "gateway_timeout" => Self::GatewayTimeout,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            _ => Self::HttpStatus(status),
        }
    }

    /// Whether this is the upstream asking us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited | Self::HttpStatus(429))
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound | Self::HttpStatus(404))
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::InvalidRequestUrl => write!(f, "invalid_request_url"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::GatewayTimeout => write!(f, "gateway_timeout"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: reqwest::StatusCode,
        /// Raw `Retry-After` header, kept unparsed so the retry policy can
        /// tell "absent" from "garbage".
        retry_after: Option<String>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),

    #[error(transparent)]
    NotionClient(#[from] NotionClientError),
}

impl AppError {
    /// Builds the error for an upstream response that was rejected.
    pub fn service(
        code: NotionErrorCode,
        message: impl Into<String>,
        status: reqwest::StatusCode,
    ) -> Self {
        AppError::NotionService {
            code,
            message: message.into(),
            status,
            retry_after: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

/// Failures decoding notion-client's typed payloads.
#[derive(Error, Debug)]
pub enum NotionClientError {
    #[error("Failed to deserialize response: {source}\nBody: {body}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Type conversion error: {message}")]
    ConversionError { message: String },
}

/// Classified failure of a wrapped upstream call.
///
/// Everything except `NotHandled` is a recognised condition callers may
/// branch on. `NotHandled` means "outside the known vocabulary" and is treated
/// as fatal for the operation at hand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotionApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream server error: {0}")]
    Server(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("client error: {0}")]
    Client(String),

    #[error("unhandled upstream error: {0}")]
    NotHandled(String),
}

impl NotionApiError {
    /// Maps an upstream error code onto the taxonomy.
    pub fn from_code(code: &NotionErrorCode, message: String) -> Self {
        use NotionErrorCode as C;

        match code {
            C::ObjectNotFound | C::HttpStatus(404) => Self::NotFound(message),
            C::InvalidJson
            | C::InvalidRequest
            | C::InvalidRequestUrl
            | C::ValidationFailed
            | C::HttpStatus(400)
            | C::HttpStatus(422) => Self::InvalidRequest(message),
            C::InternalError | C::ServiceUnavailable | C::GatewayTimeout => Self::Server(message),
            C::HttpStatus(status) if (500..600).contains(status) => Self::Server(message),
            C::Unauthorized | C::RestrictedResource | C::HttpStatus(401) | C::HttpStatus(403) => {
                Self::Permission(message)
            }
            C::HttpStatus(408) => Self::Client(message),
            _ => Self::NotHandled(format!("{}: {}", code, message)),
        }
    }

    /// Short machine-readable name for logs and JSON bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Server(_) => "server_error",
            Self::Permission(_) => "permission_denied",
            Self::Client(_) => "client_error",
            Self::NotHandled(_) => "not_handled",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<AppError> for NotionApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotionService { code, message, .. } => Self::from_code(&code, message),
            AppError::NetworkFailure(e) => Self::Client(e.to_string()),
            AppError::MalformedResponse(message) => Self::Client(message),
            AppError::NotionClient(e) => Self::Client(e.to_string()),
            AppError::ValidationError(e) => Self::InvalidRequest(e.to_string()),
            other => Self::NotHandled(other.to_string()),
        }
    }
}
