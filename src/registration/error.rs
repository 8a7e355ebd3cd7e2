//! Registration error types.

use super::config::ConfigError;
use crate::errors::RetryableError;
use crate::identity::IdentityError;
use crate::transport::TransportError;
use crate::types::PhoneNumber;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// Failure reason of a code request sent too soon after the last one.
pub const REASON_TOO_RECENT: &str = "too_recent";

/// Failure reason after too many wrong codes.
pub const REASON_TOO_MANY_GUESSES: &str = "too_many_guesses";

/// Failure reason when the service rejects the client version.
pub const REASON_OLD_VERSION: &str = "old_version";

/// Rate limit the service applied to a code request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimit {
    /// A code was sent recently.
    TooRecent,
    /// Too many wrong codes were tried.
    TooManyGuesses,
}

impl RateLimit {
    /// Wire value of the failure reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TooRecent => REASON_TOO_RECENT,
            Self::TooManyGuesses => REASON_TOO_MANY_GUESSES,
        }
    }

    fn headline(&self) -> &'static str {
        match self {
            Self::TooRecent => "Code already sent.",
            Self::TooManyGuesses => "Too many guesses.",
        }
    }
}

/// Handshake step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CodeRequest,
    CodeRegister,
    CredentialsCheck,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CodeRequest => "code request",
            Self::CodeRegister => "code register",
            Self::CredentialsCheck => "credentials check",
        })
    }
}

/// Whole minutes in `retry_after`, rounded half up.
pub fn retry_after_minutes(retry_after: Duration) -> u64 {
    (retry_after.as_secs() + 30) / 60
}

fn rate_limited_message(limit: &RateLimit, retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(
            "{} Retry after {} minutes.",
            limit.headline(),
            retry_after_minutes(*wait)
        ),
        None => format!("{} Retry later.", limit.headline()),
    }
}

fn protocol_message(stage: &Stage, status: &str, reason: &Option<String>) -> String {
    match stage {
        Stage::CodeRequest => "There was a problem trying to request the code.".to_string(),
        Stage::CodeRegister => format!(
            "An error occurred registering the registration code from WhatsApp. Reason: {}",
            reason.as_deref().unwrap_or(status)
        ),
        Stage::CredentialsCheck => format!(
            "The credentials were rejected. Reason: {}",
            reason.as_deref().unwrap_or(status)
        ),
    }
}

/// Errors returned by the registration client.
///
/// Every variant raised by a client operation has already been published
/// on the client's event hub when it is returned.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// No country row matches the phone number.
    #[error("The provided phone number is not valid.")]
    InvalidPhoneNumber { number: PhoneNumber },

    /// The request could not be exchanged with the service.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The identity could not be loaded or stored.
    #[error(transparent)]
    Persistence(#[from] IdentityError),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The service refused a code request for a while.
    #[error("{}", rate_limited_message(.limit, .retry_after))]
    RateLimited {
        limit: RateLimit,
        retry_after: Option<Duration>,
    },

    /// The service answered with a failure status.
    #[error("{}", protocol_message(.stage, .status, .reason))]
    Protocol {
        stage: Stage,
        status: String,
        reason: Option<String>,
        retry_after: Option<Duration>,
        /// Offending parameter of a `missing_param`/`bad_param` failure.
        param: Option<String>,
    },
}

impl RegistrationError {
    /// Failure reason reported by the service, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::RateLimited { limit, .. } => Some(limit.reason()),
            Self::Protocol { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Whether the service rejected the client version.
    pub fn is_old_version(&self) -> bool {
        self.reason() == Some(REASON_OLD_VERSION)
    }
}

impl RetryableError for RegistrationError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::RateLimited { .. } => true,
            Self::Protocol { retry_after, .. } => retry_after.is_some(),
            Self::InvalidPhoneNumber { .. } | Self::Persistence(_) | Self::Config(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            // A wrong or expired code can be replaced by requesting a new one.
            Self::Protocol {
                stage: Stage::CodeRegister,
                reason,
                ..
            } => reason.as_deref() != Some(REASON_OLD_VERSION),
            _ => self.is_retryable(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } | Self::Protocol { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_minutes_rounds_half_up() {
        assert_eq!(retry_after_minutes(Duration::from_secs(120)), 2);
        assert_eq!(retry_after_minutes(Duration::from_secs(90)), 2);
        assert_eq!(retry_after_minutes(Duration::from_secs(89)), 1);
        assert_eq!(retry_after_minutes(Duration::from_secs(29)), 0);
    }

    #[test]
    fn test_rate_limited_messages() {
        let err = RegistrationError::RateLimited {
            limit: RateLimit::TooRecent,
            retry_after: Some(Duration::from_secs(120)),
        };
        assert_eq!(err.to_string(), "Code already sent. Retry after 2 minutes.");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));
        assert!(err.is_retryable());

        let err = RegistrationError::RateLimited {
            limit: RateLimit::TooManyGuesses,
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(err.to_string(), "Too many guesses. Retry after 60 minutes.");
        assert_eq!(err.reason(), Some("too_many_guesses"));
    }

    #[test]
    fn test_protocol_messages() {
        let err = RegistrationError::Protocol {
            stage: Stage::CodeRequest,
            status: "fail".to_string(),
            reason: Some("bad_param".to_string()),
            retry_after: None,
            param: Some("in".to_string()),
        };
        assert_eq!(err.to_string(), "There was a problem trying to request the code.");
        assert!(!err.is_retryable());

        let err = RegistrationError::Protocol {
            stage: Stage::CodeRegister,
            status: "fail".to_string(),
            reason: Some("mismatch".to_string()),
            retry_after: None,
            param: None,
        };
        assert_eq!(
            err.to_string(),
            "An error occurred registering the registration code from WhatsApp. Reason: mismatch"
        );
        assert!(err.should_retry_operation());
    }

    #[test]
    fn test_old_version_is_not_retried() {
        let err = RegistrationError::Protocol {
            stage: Stage::CodeRegister,
            status: "fail".to_string(),
            reason: Some(REASON_OLD_VERSION.to_string()),
            retry_after: None,
            param: None,
        };
        assert!(err.is_old_version());
        assert!(!err.is_retryable());
        assert!(!err.should_retry_operation());
    }

    #[test]
    fn test_invalid_phone_number_message() {
        let err = RegistrationError::InvalidPhoneNumber {
            number: PhoneNumber::new("999").unwrap(),
        };
        assert_eq!(err.to_string(), "The provided phone number is not valid.");
    }
}
