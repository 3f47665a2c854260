//! Header providers.

use std::collections::HashMap;

use serde::Serialize;

use super::params::{FieldPairs, Parameters, escape};
use crate::error::Result;

/// Produces the headers attached to a request.
pub trait HeaderProvider: Send + Sync {
    /// Resolve to a header name → value mapping.
    ///
    /// Called once per dispatch; must return the same mapping every time.
    fn headers(&self) -> HashMap<String, String>;
}

/// Headers taken verbatim from a mapping.
#[derive(Clone, Debug, Default)]
pub struct DictionaryHeaderProvider {
    headers: HashMap<String, String>,
}

impl DictionaryHeaderProvider {
    /// Create a provider from any name/value source. Later duplicates win.
    pub fn new(headers: impl Parameters) -> Self {
        Self {
            headers: headers.into_pairs().into_iter().collect(),
        }
    }
}

impl HeaderProvider for DictionaryHeaderProvider {
    fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }
}

/// Headers derived from the named fields of a serializable value.
///
/// Each field name becomes a header name and its value is percent-encoded.
#[derive(Clone, Debug, Default)]
pub struct ObjectHeaderProvider {
    headers: HashMap<String, String>,
}

impl ObjectHeaderProvider {
    /// Flatten `value` into escaped headers.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let headers = FieldPairs::from_serialize(value)?
            .into_pairs()
            .into_iter()
            .map(|(name, value)| (name, escape(&value)))
            .collect();
        Ok(Self { headers })
    }
}

impl HeaderProvider for ObjectHeaderProvider {
    fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }
}
