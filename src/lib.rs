//! # WA Registration
//!
//! Client for a phone-number based account registration protocol.
//!
//! The client derives a stable device identity per phone number, resolves
//! the number's country and network data from static reference tables, and
//! drives a three-step handshake with the registration service: request a
//! verification code, redeem it for account credentials, and later check
//! those credentials again.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wa_registration::{
//!     CodeMethod, PhoneNumber, ReferenceTables, RegistrationClient, RegistrationConfig,
//!     RegistrationOutcome, StaticToken,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tables = Arc::new(ReferenceTables::load_dir("data")?);
//!     let number = PhoneNumber::new("34600111222")?;
//!
//!     let mut client = RegistrationClient::connect(
//!         number,
//!         tables,
//!         StaticToken::new("request-token"),
//!         RegistrationConfig::default(),
//!     )?;
//!
//!     if let RegistrationOutcome::CodeSent { .. } =
//!         client.request_code(CodeMethod::Sms, None, None).await?
//!     {
//!         let credentials = client.register_code("123-456").await?;
//!         println!("login: {}", credentials.login);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RegistrationClient<T>
//!     │
//!     ├── PhoneDissector ──► ReferenceTables (shared, read-only)
//!     ├── IdentityStore      (id.<number>.dat)
//!     ├── EventHub           (first handler per event name)
//!     │
//!     ▼
//! Transport                  (trait: HttpTransport, etc.)
//! ```
//!
//! ## Features
//!
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)

pub mod errors;
pub mod events;
pub mod identity;
pub mod phone;
pub mod registration;
pub mod tables;
pub mod transport;
pub mod types;

// Re-export commonly used types at the crate root
pub use errors::RetryableError;
pub use events::{EventHub, EventName, RegistrationEvent};
pub use identity::{IdentityError, IdentityStore};
pub use phone::{PhoneDissector, PhoneInfo};
pub use registration::{
    ClientState, Credentials, RegistrationClient, RegistrationConfig, RegistrationError,
    RegistrationOutcome, StaticToken, TokenGenerator,
};
pub use tables::{CarrierRow, ReferenceRow, ReferenceTables, TableError};
pub use transport::{Endpoint, HttpTransport, Transport, TransportError};
pub use types::{CodeMethod, Identity, PhoneNumber, VerificationCode};
