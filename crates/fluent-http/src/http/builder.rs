//! The fluent request builder.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use http::HeaderMap;
use serde::Serialize;

use super::action::{
    ActionProvider, FailHandler, FileMode, SettableActionProvider, SuccessHandler, file_handler,
    text_handler,
};
use super::auth::{AuthenticationProvider, BasicAuthenticationProvider, TextAuthenticationProvider};
use super::body::{BodyProvider, FormBodyProvider, StreamBodyProvider, TextBodyProvider};
use super::headers::{DictionaryHeaderProvider, HeaderProvider, ObjectHeaderProvider};
use super::multipart::{MultipartBodyProvider, NamedFileStream};
use super::params::Parameters;
use super::request::{HttpMethod, Request};
use super::transport::{ReqwestTransport, Transport};
use crate::error::{NetworkError, Result};

/// Accumulates the configuration of a single request, then dispatches it.
///
/// Setters mutate the builder in place and hand it back for chaining. Setting
/// a body on a `GET` or `HEAD` request fails immediately; everything that
/// goes wrong after [`go`](Self::go) is reported to the fail handler instead.
///
/// # Example
///
/// ```ignore
/// use fluent_http::RequestBuilder;
///
/// RequestBuilder::post("https://api.example.com/notes")
///     .auth("user", "secret")
///     .form([("title", "groceries"), ("body", "milk & eggs")])?
///     .on_success_text(|text| println!("created: {text}"))
///     .on_fail(|e| eprintln!("failed: {e}"))
///     .go();
/// ```
#[derive(Clone)]
pub struct RequestBuilder {
    url: String,
    method: HttpMethod,
    header_provider: Option<Arc<dyn HeaderProvider>>,
    auth_provider: Option<Arc<dyn AuthenticationProvider>>,
    body_provider: Option<Arc<dyn BodyProvider>>,
    action_provider: Option<Arc<dyn ActionProvider>>,
    success: Option<SuccessHandler>,
    fail: Option<FailHandler>,
    transport: Option<Arc<dyn Transport>>,
}

impl RequestBuilder {
    /// Create a builder for `method` requests to `url`.
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            header_provider: None,
            auth_provider: None,
            body_provider: None,
            action_provider: None,
            success: None,
            fail: None,
            transport: None,
        }
    }

    /// Create a GET request builder.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    /// Create a POST request builder.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Post)
    }

    /// Create a PUT request builder.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Put)
    }

    /// Create a DELETE request builder.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Delete)
    }

    /// Create a PATCH request builder.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Patch)
    }

    /// Create a HEAD request builder.
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Head)
    }

    /// The request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Whether a body provider is installed.
    pub fn has_body(&self) -> bool {
        self.body_provider.is_some()
    }

    // Headers

    /// Send these headers verbatim. Replaces any previous header provider.
    pub fn headers(&mut self, headers: impl Parameters) -> &mut Self {
        self.header_provider = Some(Arc::new(DictionaryHeaderProvider::new(headers)));
        self
    }

    /// Send the named fields of `value` as headers, percent-encoding each
    /// value. Replaces any previous header provider.
    pub fn headers_from<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        self.header_provider = Some(Arc::new(ObjectHeaderProvider::from_serialize(value)?));
        Ok(self)
    }

    /// Use a custom header provider. Replaces any previous one.
    pub fn header_provider(&mut self, provider: impl HeaderProvider + 'static) -> &mut Self {
        self.header_provider = Some(Arc::new(provider));
        self
    }

    // Authentication

    /// Use HTTP Basic authentication.
    pub fn auth(&mut self, username: impl Into<String>, password: impl Into<String>) -> &mut Self {
        self.auth_provider = Some(Arc::new(BasicAuthenticationProvider::new(username, password)));
        self
    }

    /// Send `text` as the `Authorization` header value.
    pub fn auth_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.auth_provider = Some(Arc::new(TextAuthenticationProvider::new(text)));
        self
    }

    /// Use a custom authentication provider.
    pub fn auth_provider(&mut self, provider: impl AuthenticationProvider + 'static) -> &mut Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    // Body

    /// Send a text body with the default text content type.
    pub fn body(&mut self, text: impl Into<String>) -> Result<&mut Self> {
        self.body_provider(TextBodyProvider::new(text))
    }

    /// Send a text body with an explicit content type.
    pub fn body_with_type(
        &mut self,
        content_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&mut Self> {
        self.body_provider(TextBodyProvider::with_content_type(content_type, text))
    }

    /// Stream the body from a reader.
    pub fn body_stream(&mut self, stream: impl Read + Send + 'static) -> Result<&mut Self> {
        self.body_provider(StreamBodyProvider::new(stream))
    }

    /// Stream the body from a reader with an explicit content type.
    pub fn body_stream_with_type(
        &mut self,
        content_type: impl Into<String>,
        stream: impl Read + Send + 'static,
    ) -> Result<&mut Self> {
        self.body_provider(StreamBodyProvider::with_content_type(content_type, stream))
    }

    /// Use a custom body provider.
    ///
    /// Fails with [`NetworkError::InvalidOperation`] for `GET` and `HEAD`.
    pub fn body_provider(&mut self, provider: impl BodyProvider + 'static) -> Result<&mut Self> {
        self.ensure_body_allowed()?;
        self.body_provider = Some(Arc::new(provider));
        Ok(self)
    }

    /// Send a URL-encoded form built from name/value pairs.
    pub fn form(&mut self, fields: impl Parameters) -> Result<&mut Self> {
        self.ensure_body_allowed()?;
        let mut provider = FormBodyProvider::new();
        provider.add_parameters(fields);
        self.body_provider(provider)
    }

    /// Send a URL-encoded form built from the named fields of `value`.
    pub fn form_from<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        self.ensure_body_allowed()?;
        let mut provider = FormBodyProvider::new();
        provider.add_serialized(value)?;
        self.body_provider(provider)
    }

    /// Upload files as `multipart/form-data`.
    pub fn upload(
        &mut self,
        files: impl IntoIterator<Item = NamedFileStream>,
    ) -> Result<&mut Self> {
        self.upload_with(files, Vec::<(String, String)>::new())
    }

    /// Upload files along with scalar form fields.
    pub fn upload_with(
        &mut self,
        files: impl IntoIterator<Item = NamedFileStream>,
        parameters: impl Parameters,
    ) -> Result<&mut Self> {
        self.ensure_body_allowed()?;
        let mut provider = multipart_with_files(files);
        provider.add_parameters(parameters);
        self.body_provider(provider)
    }

    /// Upload files along with the named fields of `parameters`.
    pub fn upload_from<T: Serialize + ?Sized>(
        &mut self,
        files: impl IntoIterator<Item = NamedFileStream>,
        parameters: &T,
    ) -> Result<&mut Self> {
        self.ensure_body_allowed()?;
        let mut provider = multipart_with_files(files);
        provider.add_serialized(parameters)?;
        self.body_provider(provider)
    }

    fn ensure_body_allowed(&self) -> Result<()> {
        if self.method.allows_body() {
            Ok(())
        } else {
            Err(NetworkError::InvalidOperation(format!(
                "Cannot set the body of a {} request",
                self.method
            )))
        }
    }

    // Completion

    /// Handle a 2xx response with its headers and unread body.
    /// Replaces any previous success handler.
    pub fn on_success<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&HeaderMap, &mut dyn Read) + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(move |headers: &HeaderMap, body: &mut dyn Read| {
            handler(headers, body);
            Ok(())
        }));
        self
    }

    /// Handle a 2xx response with a handler that may fail while consuming
    /// the body. An error is reported to the fail handler as
    /// [`NetworkError::Io`].
    pub fn on_success_try<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&HeaderMap, &mut dyn Read) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(handler));
        self
    }

    /// Handle a 2xx response with its body decoded as text.
    pub fn on_success_text<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.success = Some(text_handler(move |_, text| handler(text)));
        self
    }

    /// Handle a 2xx response with its headers and body decoded as text.
    pub fn on_success_with_headers<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&HeaderMap, String) + Send + Sync + 'static,
    {
        self.success = Some(text_handler(handler));
        self
    }

    /// Write the response body to `path`, replacing any existing content.
    ///
    /// Failing to open or write the file is reported to the fail handler.
    pub fn download_to(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.success = Some(file_handler(path.into(), FileMode::Overwrite));
        self
    }

    /// Append the response body to `path`, creating it if needed.
    pub fn append_to(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.success = Some(file_handler(path.into(), FileMode::Append));
        self
    }

    /// Handle any failure. Replaces any previous fail handler.
    pub fn on_fail<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&NetworkError) + Send + Sync + 'static,
    {
        self.fail = Some(Arc::new(handler));
        self
    }

    /// Route the outcome to `provider`.
    ///
    /// An explicit provider takes precedence: success and fail callbacks set
    /// on this builder are ignored once one is installed.
    pub fn action(&mut self, provider: impl ActionProvider + 'static) -> &mut Self {
        self.action_provider = Some(Arc::new(provider));
        self
    }

    // Dispatch

    /// Use `transport` instead of the default `reqwest` transport.
    pub fn transport(&mut self, transport: impl Transport + 'static) -> &mut Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Assemble a [`Request`] from the current configuration.
    pub fn build(&self) -> Result<Request> {
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(Request {
            url: self.url.clone(),
            method: self.method,
            action: self.completion(),
            auth: self.auth_provider.clone(),
            headers: self.header_provider.clone(),
            body: self.body_provider.clone(),
            transport,
        })
    }

    /// Dispatch the request and block until its outcome has been handled.
    ///
    /// Every failure goes to the fail handler (or action provider); nothing
    /// is returned. Calling this again sends the request again with the
    /// configuration present at that time.
    pub fn go(&self) {
        match self.build() {
            Ok(request) => request.go(),
            Err(error) => {
                tracing::warn!(target: "fluent_http::request", "Could not prepare {} {}: {}", self.method, self.url, error);
                self.completion().on_fail(&error);
            }
        }
    }

    /// Dispatch the request on tokio's blocking pool.
    ///
    /// Resolves once the outcome has been handled, so it can be awaited from
    /// async code without stalling the runtime.
    pub async fn go_async(&self) {
        let builder = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || builder.go()).await {
            tracing::error!(target: "fluent_http::request", "Request task failed: {}", e);
        }
    }

    fn completion(&self) -> Arc<dyn ActionProvider> {
        match &self.action_provider {
            Some(provider) => provider.clone(),
            None => Arc::new(SettableActionProvider::new(
                self.success.clone(),
                self.fail.clone(),
            )),
        }
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.header_provider.is_some())
            .field("auth", &self.auth_provider.is_some())
            .field("body", &self.body_provider.is_some())
            .field("action", &self.action_provider.is_some())
            .finish_non_exhaustive()
    }
}

fn multipart_with_files(files: impl IntoIterator<Item = NamedFileStream>) -> MultipartBodyProvider {
    let mut provider = MultipartBodyProvider::new();
    for file in files {
        provider.add_file(file);
    }
    provider
}
