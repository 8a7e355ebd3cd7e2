//! Core types for the registration handshake.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// PhoneNumber
// =============================================================================

/// Error when parsing a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneNumberError {
    /// Number contains non-digit characters.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// Number is empty.
    #[error("phone number cannot be empty")]
    Empty,
}

/// Full international phone number, digits only (e.g., "14155550100").
///
/// This is also the account key: the identity file and every request are
/// keyed by it.
///
/// # Example
///
/// ```rust
/// use wa_registration::PhoneNumber;
///
/// let number = PhoneNumber::new("+34 600000000").unwrap();
/// assert_eq!(number.as_str(), "34600000000");
///
/// assert!(PhoneNumber::new("0034-600").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber.
    ///
    /// A leading '+' and inner spaces are stripped.
    pub fn new(s: impl AsRef<str>) -> Result<Self, PhoneNumberError> {
        let n: String = s
            .as_ref()
            .trim()
            .trim_start_matches('+')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if n.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }
        Ok(Self(n))
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        PhoneNumber::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Length of a freshly generated identity.
pub const IDENTITY_LEN: usize = 20;

/// Legacy identity length still accepted when read back from storage.
pub const LEGACY_IDENTITY_LEN: usize = 16;

/// Error when an identity payload has an unsupported length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity must be {LEGACY_IDENTITY_LEN} or {IDENTITY_LEN} bytes, got {len}")]
pub struct IdentityLengthError {
    /// Length of the rejected payload.
    pub len: usize,
}

/// Opaque per-account client identifier, sent as the `id` request parameter.
///
/// Always 16 or 20 bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity(Vec<u8>);

impl Identity {
    /// Create an identity from raw bytes, validating the length.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, IdentityLengthError> {
        let bytes = bytes.into();
        match bytes.len() {
            LEGACY_IDENTITY_LEN | IDENTITY_LEN => Ok(Self(bytes)),
            len => Err(IdentityLengthError { len }),
        }
    }

    /// Generate a fresh 20-byte identity from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; IDENTITY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode a percent-encoded identity as stored on disk.
    pub fn from_url_encoded(encoded: &[u8]) -> Result<Self, IdentityLengthError> {
        Self::new(urlencoding::decode_binary(encoded).into_owned())
    }

    /// Percent-encoded form, used both on disk and on the wire.
    pub fn to_url_encoded(&self) -> Cow<'_, str> {
        urlencoding::encode_binary(&self.0)
    }

    /// Raw identity bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes (16 or 20).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an identity is never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

// =============================================================================
// VerificationCode
// =============================================================================

/// Verification code received by SMS or voice call.
///
/// Hyphens are stripped on construction, so "123-456" and "123456" are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Create a new code, normalizing away hyphens and surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().replace('-', ""))
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VerificationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VerificationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for VerificationCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

// =============================================================================
// CodeMethod
// =============================================================================

/// Error when parsing a delivery method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown code delivery method '{0}', expected 'sms' or 'voice'")]
pub struct CodeMethodError(pub String);

/// How the verification code should be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMethod {
    /// Text message.
    #[default]
    Sms,
    /// Voice call.
    Voice,
}

impl CodeMethod {
    /// Wire value of the `method` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Voice => "voice",
        }
    }
}

impl FromStr for CodeMethod {
    type Err = CodeMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "voice" => Ok(Self::Voice),
            other => Err(CodeMethodError(other.to_string())),
        }
    }
}

impl Display for CodeMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
