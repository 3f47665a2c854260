//! Fluent HTTP request building and dispatch.
//!
//! A [`RequestBuilder`] collects four pluggable providers, one per concern:
//!
//! - [`HeaderProvider`]: request headers
//! - [`AuthenticationProvider`]: the `Authorization` header
//! - [`BodyProvider`]: content type and payload
//! - [`ActionProvider`]: what happens with the response or failure
//!
//! [`RequestBuilder::go`] copies them into a [`Request`], which resolves each
//! provider, executes the call through a [`Transport`] and hands the outcome
//! to the action provider.
//!
//! # Example
//!
//! ```ignore
//! use fluent_http::http::{NamedFileStream, RequestBuilder};
//!
//! RequestBuilder::post("https://example.com/upload")
//!     .headers([("X-Client", "docs")])
//!     .upload_with(
//!         [NamedFileStream::open("avatar", "/tmp/me.png")?],
//!         [("user", "ana")],
//!     )?
//!     .on_success(|headers, body| { /* stream the reply */ })
//!     .on_fail(|e| eprintln!("upload failed: {e}"))
//!     .go();
//! ```

mod action;
mod auth;
mod body;
mod builder;
mod headers;
mod multipart;
mod params;
mod request;
mod transport;

pub use action::{ActionProvider, FailHandler, SettableActionProvider, SuccessHandler};
pub use auth::{AuthenticationProvider, BasicAuthenticationProvider, TextAuthenticationProvider};
pub use body::{
    BodyProvider, DEFAULT_STREAM_CONTENT_TYPE, DEFAULT_TEXT_CONTENT_TYPE, FORM_CONTENT_TYPE,
    FormBodyProvider, Payload, ResolvedBody, StreamBodyProvider, TextBodyProvider,
};
pub use builder::RequestBuilder;
pub use headers::{DictionaryHeaderProvider, HeaderProvider, ObjectHeaderProvider};
pub use multipart::{MultipartBodyProvider, NamedFileStream};
pub use params::{FieldPairs, Parameters, escape, to_pairs};
pub use request::{HttpMethod, Request};
pub use transport::{
    ReqwestTransport, Transport, TransportBuilder, TransportConfig, TransportRequest,
    TransportResponse,
};
