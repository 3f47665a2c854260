//! Completion handling: routing a response or failure to caller code.

use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::HeaderMap;

use crate::error::NetworkError;

/// Callback receiving the response headers and the unread response body.
///
/// An I/O error returned here is reported to the fail callback.
pub type SuccessHandler = Arc<dyn Fn(&HeaderMap, &mut dyn Read) -> io::Result<()> + Send + Sync>;

/// Callback receiving the reason a request did not succeed.
pub type FailHandler = Arc<dyn Fn(&NetworkError) + Send + Sync>;

/// Consumes the outcome of a dispatched request.
pub trait ActionProvider: Send + Sync {
    /// Called with the response of a 2xx request.
    fn on_success(&self, headers: &HeaderMap, body: &mut dyn Read);

    /// Called when the request failed for any reason.
    fn on_fail(&self, error: &NetworkError);
}

impl<T: ActionProvider + ?Sized> ActionProvider for Arc<T> {
    fn on_success(&self, headers: &HeaderMap, body: &mut dyn Read) {
        (**self).on_success(headers, body)
    }

    fn on_fail(&self, error: &NetworkError) {
        (**self).on_fail(error)
    }
}

/// An action provider assembled from two optional callbacks.
///
/// A missing callback turns the corresponding outcome into a no-op. When the
/// success callback fails while consuming the response, the error is passed
/// on to the fail callback as [`NetworkError::Io`].
#[derive(Clone, Default)]
pub struct SettableActionProvider {
    success: Option<SuccessHandler>,
    fail: Option<FailHandler>,
}

impl SettableActionProvider {
    /// Create a provider from the given callbacks.
    pub fn new(success: Option<SuccessHandler>, fail: Option<FailHandler>) -> Self {
        Self { success, fail }
    }

    /// Whether a success callback is present.
    pub fn has_success(&self) -> bool {
        self.success.is_some()
    }

    /// Whether a fail callback is present.
    pub fn has_fail(&self) -> bool {
        self.fail.is_some()
    }
}

impl ActionProvider for SettableActionProvider {
    fn on_success(&self, headers: &HeaderMap, body: &mut dyn Read) {
        let Some(success) = &self.success else {
            tracing::trace!(target: "fluent_http::request", "No success handler; response dropped");
            return;
        };
        if let Err(e) = success(headers, body) {
            tracing::error!(target: "fluent_http::request", "Success handler failed: {}", e);
            self.on_fail(&NetworkError::from(e));
        }
    }

    fn on_fail(&self, error: &NetworkError) {
        match &self.fail {
            Some(fail) => fail(error),
            None => tracing::trace!(target: "fluent_http::request", "No fail handler; dropped: {}", error),
        }
    }
}

impl std::fmt::Debug for SettableActionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettableActionProvider")
            .field("success", &self.has_success())
            .field("fail", &self.has_fail())
            .finish()
    }
}

/// Read a response body as text, replacing invalid UTF-8.
pub(crate) fn read_text(body: &mut dyn Read) -> io::Result<String> {
    let mut buffer = Vec::new();
    body.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Wrap a text callback so it receives the drained body.
pub(crate) fn text_handler<F>(handler: F) -> SuccessHandler
where
    F: Fn(&HeaderMap, String) + Send + Sync + 'static,
{
    Arc::new(move |headers: &HeaderMap, body: &mut dyn Read| {
        let text = read_text(body)?;
        handler(headers, text);
        Ok(())
    })
}

/// How a download handler opens its target file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FileMode {
    /// Create the file or truncate an existing one.
    Overwrite,
    /// Create the file or append to an existing one.
    Append,
}

/// A success handler that copies the body into a file.
pub(crate) fn file_handler(path: PathBuf, mode: FileMode) -> SuccessHandler {
    Arc::new(move |_headers: &HeaderMap, body: &mut dyn Read| {
        let written = copy_to_file(&path, mode, body)?;
        tracing::debug!(target: "fluent_http::request", "Wrote {} bytes to {}", written, path.display());
        Ok(())
    })
}

fn copy_to_file(path: &Path, mode: FileMode, body: &mut dyn Read) -> io::Result<u64> {
    let mut options = OpenOptions::new();
    match mode {
        FileMode::Overwrite => options.write(true).create(true).truncate(true),
        FileMode::Append => options.append(true).create(true),
    };
    // The handle is dropped (closed) on every return path.
    let mut file = options.open(path)?;
    let written = io::copy(body, &mut file)?;
    file.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Cursor;

    #[test]
    fn test_empty_provider_is_noop() {
        let provider = SettableActionProvider::default();
        provider.on_success(&HeaderMap::new(), &mut Cursor::new(b"ignored".to_vec()));
        provider.on_fail(&NetworkError::Timeout);
        assert!(!provider.has_success());
        assert!(!provider.has_fail());
    }

    #[test]
    fn test_callbacks_are_routed() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let success_seen = seen.clone();
        let fail_seen = seen.clone();
        let provider = SettableActionProvider::new(
            Some(text_handler(move |_, text| success_seen.lock().push(text))),
            Some(Arc::new(move |e: &NetworkError| fail_seen.lock().push(e.to_string()))),
        );

        provider.on_success(&HeaderMap::new(), &mut Cursor::new(b"ok".to_vec()));
        provider.on_fail(&NetworkError::Timeout);

        assert_eq!(*seen.lock(), vec!["ok".to_string(), "Request timed out".to_string()]);
    }

    #[test]
    fn test_read_text_is_lossy() {
        let text = read_text(&mut Cursor::new(vec![b'a', 0xff, b'b'])).unwrap();
        assert_eq!(text, "a\u{fffd}b");
    }

    #[test]
    fn test_file_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let overwrite = file_handler(path.clone(), FileMode::Overwrite);
        overwrite(&HeaderMap::new(), &mut Cursor::new(b"first".to_vec())).unwrap();
        overwrite(&HeaderMap::new(), &mut Cursor::new(b"second".to_vec())).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let append = file_handler(path.clone(), FileMode::Append);
        append(&HeaderMap::new(), &mut Cursor::new(b"+more".to_vec())).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second+more");
    }

    #[test]
    fn test_handler_io_error_reaches_fail() {
        let dir = tempfile::tempdir().unwrap();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();

        let provider = SettableActionProvider::new(
            Some(file_handler(dir.path().join("missing").join("out.bin"), FileMode::Overwrite)),
            Some(Arc::new(move |e: &NetworkError| sink.lock().push(e.clone()))),
        );
        provider.on_success(&HeaderMap::new(), &mut Cursor::new(b"data".to_vec()));

        let failures = failures.lock();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], NetworkError::Io(_)));
    }

    #[test]
    fn test_unreadable_body_skips_text_callback() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        let text_calls = calls.clone();
        let fail_calls = calls.clone();
        let provider = SettableActionProvider::new(
            Some(text_handler(move |_, text| text_calls.lock().push(text))),
            Some(Arc::new(move |_: &NetworkError| fail_calls.lock().push("failed".to_string()))),
        );
        provider.on_success(&HeaderMap::new(), &mut Broken);

        assert_eq!(*calls.lock(), vec!["failed".to_string()]);
    }
}
