//! Error types for request configuration and dispatch.

/// Errors raised while configuring or dispatching a request.
///
/// `InvalidOperation` is returned synchronously by the builder when a setter
/// is misused. Every other variant is a failure descriptor: it is handed to
/// the fail handler of the request and never returned from `go()`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// The builder was asked for something its method does not allow.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// A value could not be flattened into name/value pairs.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
    /// HTTP error status (anything outside 2xx).
    #[error("HTTP {status}{}", status_suffix(.message))]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },
    /// Redirect limit exceeded.
    #[error("Too many redirects")]
    TooManyRedirects,
    /// Proxy configuration error.
    #[error("Proxy error: {0}")]
    Proxy(String),
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl NetworkError {
    /// The HTTP status carried by this failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is a builder misuse rather than a runtime failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
                message: None,
            }
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for request operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
