//! Response parsing for the registration service.

use super::errors::TransportError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Status value of a successful exchange.
pub const STATUS_OK: &str = "ok";

/// Status value of a code request that dispatched a code.
pub const STATUS_SENT: &str = "sent";

/// Parsed JSON body returned by every endpoint.
///
/// Only `status` is required. The service is inconsistent about whether
/// numeric fields arrive as numbers or strings, so both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerResponse {
    /// `"ok"`, `"sent"` or `"fail"`.
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,
    /// Seconds until the operation may be retried.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub retry_after: Option<u64>,
    /// Name of the offending parameter on a `bad_param` failure.
    #[serde(default, deserialize_with = "lenient_string")]
    pub param: Option<String>,
    /// Number of digits of the dispatched code.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub length: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub login: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pw: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub account_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub expiration: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub price_expiration: Option<i64>,
}

impl ServerResponse {
    /// Parse a response body.
    pub fn from_text(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(TransportError::DeserializeJson)
    }

    /// Whether `status` is `"ok"`.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Whether `status` is `"sent"`.
    pub fn is_sent(&self) -> bool {
        self.status == STATUS_SENT
    }

    /// Whether the failure reason equals `reason`.
    pub fn has_reason(&self, reason: &str) -> bool {
        self.reason.as_deref() == Some(reason)
    }

    /// Return a required field or [`TransportError::MissingField`].
    pub fn require<'a>(
        value: &'a Option<String>,
        field: &'static str,
    ) -> Result<&'a str, TransportError> {
        value
            .as_deref()
            .ok_or(TransportError::MissingField { field })
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let parsed = match &value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    Ok(parsed.or_else(|| {
        ignore_field(value.as_ref(), "unsigned integer");
        None
    }))
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let parsed = match &value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    Ok(parsed.or_else(|| {
        ignore_field(value.as_ref(), "integer");
        None
    }))
}

// Optional fields never fail the response; `status` alone drives branching.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn ignore_field(value: Option<&Value>, expected: &str) {
    #[cfg(feature = "tracing")]
    if let Some(value) = value {
        warn!(value = %value, expected, "Ignoring malformed response field");
    }
}
