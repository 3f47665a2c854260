//! The transport collaborator that performs the actual HTTP call.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;

use super::body::Payload;
use super::request::HttpMethod;
use crate::error::{NetworkError, Result};

/// A fully assembled outbound request.
#[derive(Debug)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request URL.
    pub url: String,
    /// Request headers, content type and authorization included.
    pub headers: http::HeaderMap,
    /// Request body, if any.
    pub body: Option<Payload>,
}

/// The response returned by a transport.
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: http::HeaderMap,
    /// The unread response body.
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes requests on behalf of [`Request`](super::Request).
///
/// Implementations block until the response headers are available and
/// return the body unread. Connection-level problems are reported as
/// errors; HTTP error statuses are returned as ordinary responses.
pub trait Transport: Send + Sync {
    /// Execute a request.
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        (**self).execute(request)
    }
}

/// Configuration for the default transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!("FluentHttp/{} (Rust)", env!("CARGO_PKG_VERSION"))),
            proxy: None,
        }
    }
}

/// Builder for a [`ReqwestTransport`] with custom configuration.
#[derive(Debug, Default)]
pub struct TransportBuilder {
    config: TransportConfig,
}

impl TransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = reqwest::blocking::Client::builder();

        // reqwest's blocking client applies a 30s timeout unless told otherwise
        builder = builder.timeout(self.config.timeout);
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| NetworkError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(ReqwestTransport {
            client,
            config: self.config,
        })
    }
}

/// The default transport, backed by `reqwest`'s blocking client.
///
/// Must not be driven from inside an async runtime's worker threads; use
/// [`RequestBuilder::go_async`](super::RequestBuilder::go_async) there.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        TransportBuilder::new().build()
    }

    /// Create a builder for configuring a transport.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = url::Url::parse(&request.url)?;

        let mut req_builder = self
            .client
            .request(request.method.to_reqwest(), url)
            .headers(request.headers);

        if let Some(payload) = request.body {
            req_builder = req_builder.body(payload);
        }

        let response = req_builder.send()?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        tracing::debug!(target: "fluent_http::transport", "{} {} -> {}", request.method, request.url, status);

        Ok(TransportResponse {
            status,
            headers,
            body: Box::new(response),
        })
    }
}

impl From<Payload> for reqwest::blocking::Body {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Bytes(bytes) => bytes.into(),
            Payload::Stream(reader) => reqwest::blocking::Body::new(reader),
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish()
    }
}
