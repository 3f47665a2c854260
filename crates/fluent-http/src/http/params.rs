//! Name/value flattening for headers, form fields and multipart parameters.
//!
//! Anything that can be turned into an ordered list of `(name, value)` string
//! pairs implements [`Parameters`]. Maps, vectors and arrays of pairs work
//! directly; arbitrary structs go through [`to_pairs`], which enumerates the
//! top-level fields of their `serde` representation.

use std::collections::{BTreeMap, HashMap};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{NetworkError, Result};

/// Everything except the RFC 3986 unreserved characters.
const DATA_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a value the way URI data strings are escaped.
///
/// Space becomes `%20`, never `+`.
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, DATA_ENCODE_SET).to_string()
}

/// A source of ordered name/value string pairs.
pub trait Parameters {
    /// Flatten into `(name, value)` pairs, preserving the source's order.
    fn into_pairs(self) -> Vec<(String, String)>;
}

impl<K: Into<String>, V: Into<String>> Parameters for HashMap<K, V> {
    fn into_pairs(self) -> Vec<(String, String)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> Parameters for BTreeMap<K, V> {
    fn into_pairs(self) -> Vec<(String, String)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> Parameters for Vec<(K, V)> {
    fn into_pairs(self) -> Vec<(String, String)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> Parameters for [(K, V); N] {
    fn into_pairs(self) -> Vec<(String, String)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Pairs produced from a serializable value by [`to_pairs`].
///
/// Wrapping the result lets the builder accept it anywhere a map is accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPairs(Vec<(String, String)>);

impl FieldPairs {
    /// Flatten a serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        to_pairs(value).map(Self)
    }
}

impl Parameters for FieldPairs {
    fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

/// Enumerate the top-level fields of a serializable value.
///
/// Field order follows declaration order. Strings are taken verbatim,
/// numbers and booleans through their display form, `null` becomes an empty
/// string and nested arrays or objects are rendered as compact JSON. Unit
/// values (`()`, unit structs) produce no pairs; any other non-object value is
/// rejected.
pub fn to_pairs<T: Serialize + ?Sized>(value: &T) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| (name, scalar_to_string(value)))
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(NetworkError::Serialization(format!(
            "expected a struct or map with named fields, got {}",
            kind_of(&other)
        ))),
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Login {
        user: &'static str,
        attempts: u32,
        remember: bool,
        nickname: Option<String>,
    }

    #[test]
    fn test_escape_data_string() {
        assert_eq!(escape("2 3"), "2%203");
        assert_eq!(escape("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(escape("x&y=z"), "x%26y%3Dz");
        assert_eq!(escape("é"), "%C3%A9");
    }

    #[test]
    fn test_struct_fields_in_declaration_order() {
        let pairs = to_pairs(&Login {
            user: "ana",
            attempts: 3,
            remember: true,
            nickname: None,
        })
        .unwrap();

        assert_eq!(
            pairs,
            vec![
                ("user".to_string(), "ana".to_string()),
                ("attempts".to_string(), "3".to_string()),
                ("remember".to_string(), "true".to_string()),
                ("nickname".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_unit_has_no_fields() {
        assert!(to_pairs(&()).unwrap().is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = to_pairs(&42).unwrap_err();
        assert!(matches!(err, NetworkError::Serialization(_)));
    }

    #[test]
    fn test_map_and_array_sources() {
        let pairs = [("a", "1"), ("b", "2")].into_pairs();
        assert_eq!(pairs[1], ("b".to_string(), "2".to_string()));

        let mut map = BTreeMap::new();
        map.insert("z", "26");
        map.insert("y", "25");
        let pairs = map.into_pairs();
        assert_eq!(pairs[0].0, "y");
    }

    #[test]
    fn test_field_pairs_from_struct() {
        #[derive(Serialize)]
        struct Filter {
            tags: Vec<&'static str>,
            limit: Option<u8>,
        }

        let pairs = FieldPairs::from_serialize(&Filter {
            tags: vec!["a", "b"],
            limit: Some(5),
        })
        .unwrap()
        .into_pairs();
        assert_eq!(
            pairs,
            vec![
                ("tags".to_string(), r#"["a","b"]"#.to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
        assert!(FieldPairs::from_serialize("text").is_err());
    }
}
