//! Request token generation.
//!
//! The code request carries a token derived from the country name, the
//! national number and the platform. The derivation depends on the client
//! build being impersonated, so it is supplied by the caller.

use std::fmt;

/// Produces the `token` parameter of a code request.
pub trait TokenGenerator: Send + Sync {
    /// Token for `national_number` in `country` on `platform`.
    fn request_token(&self, country: &str, national_number: &str, platform: &str) -> String;
}

impl<F> TokenGenerator for F
where
    F: Fn(&str, &str, &str) -> String + Send + Sync,
{
    fn request_token(&self, country: &str, national_number: &str, platform: &str) -> String {
        self(country, national_number, platform)
    }
}

/// Always returns the same token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticToken").field(&"[REDACTED]").finish()
    }
}

impl TokenGenerator for StaticToken {
    fn request_token(&self, _country: &str, _national_number: &str, _platform: &str) -> String {
        self.0.clone()
    }
}
