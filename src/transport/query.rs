//! Ordered request query parameters.

use std::fmt::{self, Formatter};

/// Keys whose values never appear in logs.
const REDACTED_KEYS: &[&str] = &["id", "code", "token"];

/// A single query value.
#[derive(Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// UTF-8 text, form-encoded on the wire.
    Text(String),
    /// Raw bytes, percent-encoded byte by byte on the wire.
    Binary(Vec<u8>),
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Binary(bytes) => f.debug_tuple("Binary").field(&hex::encode(bytes)).finish(),
        }
    }
}

/// Query parameters in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, ParamValue)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text parameter.
    pub fn push(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key, ParamValue::Text(value.into())));
        self
    }

    /// Append a binary parameter.
    pub fn push_binary(&mut self, key: &'static str, value: impl Into<Vec<u8>>) -> &mut Self {
        self.pairs.push((key, ParamValue::Binary(value.into())));
        self
    }

    /// Text value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(|value| match value {
            ParamValue::Text(text) => Some(text.as_str()),
            ParamValue::Binary(_) => None,
        })
    }

    /// Value of the first parameter named `key`.
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Whether a parameter named `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Parameter names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(k, _)| *k)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as a URL query string (without the leading `?`).
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let mut parts = Vec::with_capacity(self.pairs.len());
        for (key, value) in &self.pairs {
            match value {
                ParamValue::Text(text) => {
                    parts.push(serde_urlencoded::to_string([(*key, text.as_str())])?);
                }
                ParamValue::Binary(bytes) => {
                    parts.push(format!("{key}={}", urlencoding::encode_binary(bytes)));
                }
            }
        }
        Ok(parts.join("&"))
    }

    /// Human-readable form for logs, with sensitive values masked.
    pub fn redacted(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                if REDACTED_KEYS.contains(key) {
                    return format!("{key}=[REDACTED]");
                }
                match value {
                    ParamValue::Text(text) => format!("{key}={text}"),
                    ParamValue::Binary(bytes) => format!("{key}=<{} bytes>", bytes.len()),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_preserves_order_and_encodes() {
        let mut query = QueryParams::new();
        query
            .push("cc", "34")
            .push_binary("id", vec![0x00, b'a', 0xff, b' '])
            .push("s", "")
            .push("rchash", "a+b/c=");

        assert_eq!(
            query.to_query_string().unwrap(),
            "cc=34&id=%00a%FF%20&s=&rchash=a%2Bb%2Fc%3D"
        );
    }

    #[test]
    fn test_get_and_contains() {
        let mut query = QueryParams::new();
        query.push("cc", "1").push_binary("id", vec![1, 2, 3]);

        assert_eq!(query.get("cc"), Some("1"));
        assert_eq!(query.get("id"), None);
        assert_eq!(query.value("id"), Some(&ParamValue::Binary(vec![1, 2, 3])));
        assert!(query.contains("id"));
        assert!(!query.contains("code"));
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["cc", "id"]);
    }

    #[test]
    fn test_redacted_masks_sensitive_values() {
        let mut query = QueryParams::new();
        query
            .push("cc", "1")
            .push_binary("id", vec![0u8; 20])
            .push("code", "123456");

        let redacted = query.redacted();
        assert_eq!(redacted, "cc=1 id=[REDACTED] code=[REDACTED]");
    }
}
