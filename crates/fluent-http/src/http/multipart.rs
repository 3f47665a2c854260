//! `multipart/form-data` bodies built from named files and scalar fields.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;

use super::body::{BodyProvider, DEFAULT_STREAM_CONTENT_TYPE, Payload, ResolvedBody};
use super::params::{FieldPairs, Parameters};
use crate::error::Result;

enum FileSource {
    Bytes(Bytes),
    Stream(Mutex<Option<Box<dyn Read + Send>>>),
}

/// A file to upload, bound to a form field.
pub struct NamedFileStream {
    name: String,
    file_name: String,
    content_type: String,
    source: FileSource,
}

impl NamedFileStream {
    /// Upload the contents of `stream` as `file_name` under field `name`.
    ///
    /// The stream is read once; a second dispatch sends an empty part.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        stream: impl Read + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type: DEFAULT_STREAM_CONTENT_TYPE.to_string(),
            source: FileSource::Stream(Mutex::new(Some(Box::new(stream)))),
        }
    }

    /// Upload an in-memory buffer as `file_name` under field `name`.
    pub fn from_bytes(
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type: DEFAULT_STREAM_CONTENT_TYPE.to_string(),
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// Open a file on disk; the part's file name is the last path component.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, file_name, file))
    }

    /// Set the `Content-Type` of this part.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The form field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name reported to the server.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn take_source(&self) -> Payload {
        match &self.source {
            FileSource::Bytes(bytes) => Payload::Bytes(bytes.clone()),
            FileSource::Stream(stream) => match stream.lock().take() {
                Some(reader) => Payload::Stream(reader),
                None => {
                    tracing::warn!(target: "fluent_http::body", "File part '{}' already consumed; sending it empty", self.name);
                    Payload::Bytes(Bytes::new())
                }
            },
        }
    }
}

impl std::fmt::Debug for NamedFileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedFileStream")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A `multipart/form-data` body.
///
/// Scalar fields are written first, then file parts, each group in insertion
/// order. The boundary is chosen randomly when the provider is created.
pub struct MultipartBodyProvider {
    boundary: String,
    fields: Vec<(String, String)>,
    files: Vec<NamedFileStream>,
}

impl Default for MultipartBodyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBodyProvider {
    /// Create an empty multipart body with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(gen_boundary())
    }

    /// Create an empty multipart body with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
            files: Vec::new(),
        }
    }

    /// The boundary token separating parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header value, boundary included.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Add a file part.
    pub fn add_file(&mut self, file: NamedFileStream) -> &mut Self {
        self.files.push(file);
        self
    }

    /// Add scalar fields.
    pub fn add_parameters(&mut self, parameters: impl Parameters) -> &mut Self {
        self.fields.extend(parameters.into_pairs());
        self
    }

    /// Add the named fields of a serializable value as scalar fields.
    pub fn add_serialized<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        self.add_parameters(FieldPairs::from_serialize(value)?);
        Ok(self)
    }

    fn field_header(&self, name: &str) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
            self.boundary,
            quote(name)
        )
    }

    fn file_header(&self, file: &NamedFileStream) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            quote(&file.name),
            quote(&file.file_name),
            file.content_type
        )
    }
}

impl BodyProvider for MultipartBodyProvider {
    fn resolve(&self) -> Result<ResolvedBody> {
        let mut segments = Segments::default();

        for (name, value) in &self.fields {
            segments.push_bytes(self.field_header(name).as_bytes());
            segments.push_bytes(value.as_bytes());
            segments.push_bytes(b"\r\n");
        }

        for file in &self.files {
            segments.push_bytes(self.file_header(file).as_bytes());
            match file.take_source() {
                Payload::Bytes(bytes) => segments.push_bytes(&bytes),
                Payload::Stream(reader) => segments.push_stream(reader),
            }
            segments.push_bytes(b"\r\n");
        }

        segments.push_bytes(format!("--{}--\r\n", self.boundary).as_bytes());

        Ok(ResolvedBody {
            content_type: self.content_type(),
            payload: segments.finish(),
        })
    }
}

impl std::fmt::Debug for MultipartBodyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartBodyProvider")
            .field("boundary", &self.boundary)
            .field("fields", &self.fields)
            .field("files", &self.files)
            .finish()
    }
}

/// Accumulates payload pieces, buffering bytes between stream parts.
#[derive(Default)]
struct Segments {
    buffer: Vec<u8>,
    readers: Vec<Box<dyn Read + Send>>,
}

impl Segments {
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn push_stream(&mut self, reader: Box<dyn Read + Send>) {
        let buffered = std::mem::take(&mut self.buffer);
        self.readers.push(Box::new(Cursor::new(buffered)));
        self.readers.push(reader);
    }

    fn finish(mut self) -> Payload {
        if self.readers.is_empty() {
            return Payload::Bytes(Bytes::from(self.buffer));
        }
        self.readers.push(Box::new(Cursor::new(self.buffer)));
        let chained = self
            .readers
            .into_iter()
            .reduce(|acc, next| -> Box<dyn Read + Send> { Box::new(acc.chain(next)) })
            .unwrap_or_else(|| Box::new(std::io::empty()));
        Payload::Stream(chained)
    }
}

/// Escape a quoted header parameter. Line breaks are percent-encoded.
fn quote(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn gen_boundary() -> String {
    let a: u64 = rand::random();
    let b: u64 = rand::random();
    let c: u64 = rand::random();
    let d: u64 = rand::random();

    format!("{a:016x}-{b:016x}-{c:016x}-{d:016x}")
}
