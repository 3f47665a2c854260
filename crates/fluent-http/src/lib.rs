//! Fluent, provider-based HTTP requests.
//!
//! This crate configures and fires a single outbound HTTP request:
//!
//! - **Headers**: from a map, or from the named fields of any `Serialize` value
//! - **Authentication**: Basic credentials or a raw `Authorization` value
//! - **Bodies**: text, streams, URL-encoded forms and multipart uploads
//! - **Completion**: success/fail callbacks, file downloads, or a custom
//!   [`ActionProvider`]
//!
//! # Example
//!
//! ```ignore
//! use fluent_http::RequestBuilder;
//!
//! RequestBuilder::get("https://api.example.com/status")
//!     .auth_text("Bearer my-token")
//!     .on_success_text(|body| println!("{body}"))
//!     .on_fail(|e| eprintln!("request failed: {e}"))
//!     .go();
//! ```
//!
//! ## Forms and uploads
//!
//! ```ignore
//! RequestBuilder::post("https://example.com/login")
//!     .form([("user", "ana"), ("password", "s3cret")])?
//!     .go();
//!
//! RequestBuilder::put("https://example.com/files")
//!     .upload([NamedFileStream::open("file", "report.pdf")?])?
//!     .download_to("receipt.json")
//!     .go();
//! ```
//!
//! Setting a body on a `GET` or `HEAD` request returns
//! [`NetworkError::InvalidOperation`] straight away. Everything that fails
//! after dispatch is delivered to the fail handler instead of being returned.
//!
//! ## Transports
//!
//! Requests are executed by a [`Transport`]. The default is
//! [`ReqwestTransport`], a blocking `reqwest` client; supply your own with
//! [`RequestBuilder::transport`]. From async code use
//! [`RequestBuilder::go_async`], which runs the blocking call on tokio's
//! blocking pool.

mod error;
pub mod http;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use crate::http::{
    ActionProvider, AuthenticationProvider, BodyProvider, HeaderProvider, HttpMethod,
    NamedFileStream, Request, RequestBuilder, ReqwestTransport, SettableActionProvider, Transport,
    TransportConfig,
};
