//! Body providers and resolved payloads.

use std::io::Read;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;

use super::params::{FieldPairs, Parameters, escape};
use crate::error::Result;

/// Content type used by [`TextBodyProvider`] when none is given.
pub const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Content type used by [`StreamBodyProvider`] when none is given.
pub const DEFAULT_STREAM_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of URL-encoded forms.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The bytes of a request or response body.
pub enum Payload {
    /// An in-memory buffer.
    Bytes(Bytes),
    /// A reader consumed once by the transport.
    Stream(Box<dyn Read + Send>),
}

impl Payload {
    /// Drain the payload into memory.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Stream(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer)?;
                Ok(Bytes::from(buffer))
            }
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A body provider resolved for one dispatch.
#[derive(Debug)]
pub struct ResolvedBody {
    /// Value of the `Content-Type` header.
    pub content_type: String,
    /// The body bytes.
    pub payload: Payload,
}

/// Produces the content type and payload of a request.
pub trait BodyProvider: Send + Sync {
    /// Resolve the body for a dispatch.
    ///
    /// Buffer-backed providers return identical output on every call.
    /// Stream-backed providers can only be read once.
    fn resolve(&self) -> Result<ResolvedBody>;
}

/// A text body.
#[derive(Clone, Debug)]
pub struct TextBodyProvider {
    content_type: String,
    text: String,
}

impl TextBodyProvider {
    /// Create a text body with the default content type.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_content_type(DEFAULT_TEXT_CONTENT_TYPE, text)
    }

    /// Create a text body with an explicit content type.
    pub fn with_content_type(content_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            text: text.into(),
        }
    }
}

impl BodyProvider for TextBodyProvider {
    fn resolve(&self) -> Result<ResolvedBody> {
        Ok(ResolvedBody {
            content_type: self.content_type.clone(),
            payload: Payload::Bytes(Bytes::from(self.text.clone())),
        })
    }
}

/// A body read from a caller-supplied stream.
///
/// The stream is handed to the transport untouched, so it can be sent once.
/// Later resolutions produce an empty payload.
pub struct StreamBodyProvider {
    content_type: String,
    stream: Mutex<Option<Box<dyn Read + Send>>>,
}

impl StreamBodyProvider {
    /// Wrap a stream with the default content type.
    pub fn new(stream: impl Read + Send + 'static) -> Self {
        Self::with_content_type(DEFAULT_STREAM_CONTENT_TYPE, stream)
    }

    /// Wrap a stream with an explicit content type.
    pub fn with_content_type(
        content_type: impl Into<String>,
        stream: impl Read + Send + 'static,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            stream: Mutex::new(Some(Box::new(stream))),
        }
    }
}

impl BodyProvider for StreamBodyProvider {
    fn resolve(&self) -> Result<ResolvedBody> {
        let payload = match self.stream.lock().take() {
            Some(stream) => Payload::Stream(stream),
            None => {
                tracing::warn!(target: "fluent_http::body", "Stream body already consumed; sending an empty payload");
                Payload::Bytes(Bytes::new())
            }
        };
        Ok(ResolvedBody {
            content_type: self.content_type.clone(),
            payload,
        })
    }
}

impl std::fmt::Debug for StreamBodyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBodyProvider")
            .field("content_type", &self.content_type)
            .field("consumed", &self.stream.lock().is_none())
            .finish()
    }
}

/// A URL-encoded form body.
#[derive(Clone, Debug, Default)]
pub struct FormBodyProvider {
    fields: Vec<(String, String)>,
}

impl FormBodyProvider {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append fields in their source order.
    pub fn add_parameters(&mut self, parameters: impl Parameters) -> &mut Self {
        self.fields.extend(parameters.into_pairs());
        self
    }

    /// Append the named fields of a serializable value.
    pub fn add_serialized<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        self.add_parameters(FieldPairs::from_serialize(value)?);
        Ok(self)
    }

    /// Append a single field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Render the `name=value&…` form text.
    pub fn encode(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl BodyProvider for FormBodyProvider {
    fn resolve(&self) -> Result<ResolvedBody> {
        Ok(ResolvedBody {
            content_type: FORM_CONTENT_TYPE.to_string(),
            payload: Payload::Bytes(Bytes::from(self.encode())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn bytes_of(body: ResolvedBody) -> Vec<u8> {
        body.payload.into_bytes().unwrap().to_vec()
    }

    #[test]
    fn test_text_body() {
        let provider = TextBodyProvider::new("hi");
        let body = provider.resolve().unwrap();
        assert_eq!(body.content_type, DEFAULT_TEXT_CONTENT_TYPE);
        assert_eq!(bytes_of(body), b"hi");

        let provider = TextBodyProvider::with_content_type("application/json", "{}");
        assert_eq!(provider.resolve().unwrap().content_type, "application/json");
    }

    #[test]
    fn test_text_body_is_repeatable() {
        let provider = TextBodyProvider::new("same");
        assert_eq!(
            bytes_of(provider.resolve().unwrap()),
            bytes_of(provider.resolve().unwrap())
        );
    }

    #[test]
    fn test_stream_body_is_single_read() {
        let provider = StreamBodyProvider::new(Cursor::new(b"stream data".to_vec()));
        let first = provider.resolve().unwrap();
        assert_eq!(first.content_type, DEFAULT_STREAM_CONTENT_TYPE);
        assert_eq!(bytes_of(first), b"stream data");

        let second = provider.resolve().unwrap();
        assert!(bytes_of(second).is_empty());
    }

    #[test]
    fn test_form_encoding() {
        let mut provider = FormBodyProvider::new();
        provider.add_parameters([("a", "1"), ("b", "2 3")]);

        let body = provider.resolve().unwrap();
        assert_eq!(body.content_type, FORM_CONTENT_TYPE);
        assert_eq!(bytes_of(body), b"a=1&b=2%203");
    }

    #[test]
    fn test_form_is_repeatable() {
        let mut provider = FormBodyProvider::new();
        provider.add_parameters([("q", "a b"), ("lang", "en")]);

        let first = provider.resolve().unwrap();
        let second = provider.resolve().unwrap();
        assert_eq!(first.content_type, second.content_type);
        assert_eq!(bytes_of(first), bytes_of(second));
    }

    #[test]
    fn test_form_keeps_insertion_order() {
        #[derive(Serialize)]
        struct Search {
            q: &'static str,
            page: u32,
        }

        let mut provider = FormBodyProvider::new();
        provider.add("z", "last?");
        provider
            .add_serialized(&Search {
                q: "rust & go",
                page: 2,
            })
            .unwrap();

        assert_eq!(provider.encode(), "z=last%3F&q=rust%20%26%20go&page=2");
    }

    #[test]
    fn test_empty_form() {
        assert_eq!(FormBodyProvider::new().encode(), "");
    }
}
