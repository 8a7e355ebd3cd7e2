//! Outbound request transport.
//!
//! The registration client never talks HTTP directly: it hands an
//! [`Endpoint`] and a [`QueryParams`] set to a [`Transport`] and gets a
//! parsed [`ServerResponse`] back. [`HttpTransport`] is the production
//! implementation; tests can plug in their own.

pub mod client;
pub mod errors;
mod query;
mod response;

pub use client::{HttpTransport, HttpTransportBuilder};
pub use errors::TransportError;
pub use query::{ParamValue, QueryParams};
pub use response::ServerResponse;

use std::fmt::{self, Display, Formatter};
use std::future::Future;

/// Remote endpoints of the registration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Request a verification code.
    Code,
    /// Redeem a verification code for credentials.
    Register,
    /// Check existing credentials.
    Exist,
}

impl Endpoint {
    /// Short endpoint name, as used in URL paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Register => "register",
            Self::Exist => "exist",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends one request and returns the parsed response.
///
/// Each call is a single exchange; implementations must not retry.
/// Timeouts are the transport's responsibility and surface as
/// [`TransportError`].
///
/// # Example
///
/// ```rust,ignore
/// use wa_registration::transport::{Endpoint, QueryParams, ServerResponse, Transport, TransportError};
///
/// #[derive(Clone)]
/// struct AlwaysSent;
///
/// impl Transport for AlwaysSent {
///     async fn send(&self, _: Endpoint, _: &QueryParams) -> Result<ServerResponse, TransportError> {
///         ServerResponse::from_text(r#"{"status":"sent","length":6}"#)
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Send `query` to `endpoint`.
    fn send(
        &self,
        endpoint: Endpoint,
        query: &QueryParams,
    ) -> impl Future<Output = Result<ServerResponse, TransportError>> + Send;
}
