//! Authentication providers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Produces the value of the `Authorization` header.
pub trait AuthenticationProvider: Send + Sync {
    /// Resolve to the full header value, scheme included.
    fn auth_header(&self) -> String;
}

/// HTTP Basic authentication.
#[derive(Clone)]
pub struct BasicAuthenticationProvider {
    username: String,
    password: String,
}

impl BasicAuthenticationProvider {
    /// Create a provider for the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl AuthenticationProvider for BasicAuthenticationProvider {
    fn auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl std::fmt::Debug for BasicAuthenticationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticationProvider")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A pre-encoded authorization value, sent as-is (e.g. `Bearer abc`).
#[derive(Clone)]
pub struct TextAuthenticationProvider {
    text: String,
}

impl TextAuthenticationProvider {
    /// Create a provider that sends `text` verbatim.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl AuthenticationProvider for TextAuthenticationProvider {
    fn auth_header(&self) -> String {
        self.text.clone()
    }
}

impl std::fmt::Debug for TextAuthenticationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAuthenticationProvider")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        let provider = BasicAuthenticationProvider::new("Aladdin", "open sesame");
        assert_eq!(provider.auth_header(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn test_text_auth_header() {
        let provider = TextAuthenticationProvider::new("Bearer token123");
        assert_eq!(provider.auth_header(), "Bearer token123");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let basic = format!("{:?}", BasicAuthenticationProvider::new("user", "hunter2"));
        assert!(!basic.contains("hunter2"));
        let text = format!("{:?}", TextAuthenticationProvider::new("Bearer secret"));
        assert!(!text.contains("secret"));
    }
}
