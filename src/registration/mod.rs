//! Registration handshake: code request, code register and credentials
//! check.

pub mod client;
pub mod config;
pub mod error;
pub mod outcome;
pub mod params;
pub mod token;
pub mod version;

pub use client::RegistrationClient;
pub use config::{ConfigError, RegistrationConfig, RegistrationConfigBuilder};
pub use error::{RateLimit, RegistrationError, Stage};
pub use outcome::{ClientState, Credentials, RegistrationOutcome};
pub use token::{StaticToken, TokenGenerator};
pub use version::{HttpVersionChecker, NoopVersionChecker, VersionChecker, VersionInfo};
