//! HTTP methods and the assembled request that owns execution.

use std::sync::Arc;

use http::HeaderMap;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};

use super::action::{ActionProvider, read_text};
use super::auth::AuthenticationProvider;
use super::body::BodyProvider;
use super::headers::HeaderProvider;
use super::transport::{Transport, TransportRequest, TransportResponse};
use crate::error::{NetworkError, Result};

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
    /// HTTP HEAD method.
    Head,
    /// HTTP OPTIONS method.
    Options,
}

impl HttpMethod {
    /// Whether requests with this method may carry a body.
    pub fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// A request assembled from a builder's final state.
///
/// Executing it resolves each provider, sends the result through the
/// transport and reports the outcome to the action provider. Nothing is
/// returned to the caller.
pub struct Request {
    /// The request URL.
    pub url: String,
    /// The HTTP method.
    pub method: HttpMethod,
    /// Receives the outcome.
    pub action: Arc<dyn ActionProvider>,
    /// Produces the `Authorization` header.
    pub auth: Option<Arc<dyn AuthenticationProvider>>,
    /// Produces the request headers.
    pub headers: Option<Arc<dyn HeaderProvider>>,
    /// Produces the request body.
    pub body: Option<Arc<dyn BodyProvider>>,
    /// Performs the call.
    pub transport: Arc<dyn Transport>,
}

impl Request {
    /// Execute the request and route the outcome to the action provider.
    pub fn go(self) {
        tracing::debug!(target: "fluent_http::request", "Dispatching {} {}", self.method, self.url);

        let response = self.assemble().and_then(|request| self.transport.execute(request));

        match response {
            Ok(response) if response.is_success() => {
                let TransportResponse {
                    headers, mut body, ..
                } = response;
                self.action.on_success(&headers, &mut body);
            }
            Ok(response) => {
                let error = status_error(response);
                tracing::warn!(target: "fluent_http::request", "{} {} failed: {}", self.method, self.url, error);
                self.action.on_fail(&error);
            }
            Err(error) => {
                tracing::warn!(target: "fluent_http::request", "{} {} failed: {}", self.method, self.url, error);
                self.action.on_fail(&error);
            }
        }
    }

    /// Resolve every provider into the outbound request.
    pub(crate) fn assemble(&self) -> Result<TransportRequest> {
        let mut headers = HeaderMap::new();

        if let Some(provider) = &self.headers {
            for (name, value) in provider.headers() {
                headers.insert(
                    HeaderName::from_bytes(name.as_bytes())?,
                    HeaderValue::from_str(&value)?,
                );
            }
        }

        if let Some(provider) = &self.auth {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&provider.auth_header())?);
        }

        let body = match &self.body {
            Some(provider) => {
                let resolved = provider.resolve()?;
                // The body's content type wins over one set by the header provider
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(&resolved.content_type)?);
                Some(resolved.payload)
            }
            None => None,
        };

        Ok(TransportRequest {
            method: self.method,
            url: self.url.clone(),
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("auth", &self.auth.is_some())
            .field("headers", &self.headers.is_some())
            .field("body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

/// Build the failure for a non-2xx response, using its body as the message.
fn status_error(response: TransportResponse) -> NetworkError {
    let TransportResponse {
        status, mut body, ..
    } = response;
    let message = read_text(&mut body).ok().filter(|text| !text.is_empty());
    NetworkError::HttpStatus { status, message }
}
