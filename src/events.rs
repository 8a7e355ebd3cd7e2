//! Protocol event notifications.
//!
//! Every handshake outcome, success or failure, is published here before
//! the result reaches the caller. The hub binds handlers by [`EventName`];
//! [`EventHub::publish`] delivers to the first handler registered for the
//! name only, while [`EventHub::publish_all`] fans out to every handler in
//! registration order.
//!
//! # Example
//!
//! ```rust
//! use wa_registration::events::{EventHub, EventName, RegistrationEvent};
//! use wa_registration::PhoneNumber;
//!
//! let mut hub: EventHub<&'static str> = EventHub::new();
//! hub.subscribe(EventName::DissectPhoneFailed, |_| "first");
//! hub.subscribe(EventName::DissectPhoneFailed, |_| "second");
//!
//! let event = RegistrationEvent::DissectPhoneFailed {
//!     phone_number: PhoneNumber::new("999").unwrap(),
//! };
//! assert_eq!(hub.publish(&event), Some("first"));
//! assert_eq!(hub.publish_all(&event), vec!["first", "second"]);
//! ```

use crate::phone::PhoneInfo;
use crate::registration::Credentials;
use crate::transport::Endpoint;
use crate::types::{CodeMethod, PhoneNumber};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::trace;

/// Names handlers are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Phone number matched a country row.
    DissectPhone,
    /// Phone number matched no country row.
    DissectPhoneFailed,
    /// Verification code was sent.
    CodeRequest,
    /// Code request failed for a reason without a dedicated event.
    CodeRequestFailed,
    /// Code request rejected with `too_recent`.
    CodeRequestFailedTooRecent,
    /// Code request rejected with `too_many_guesses`.
    CodeRequestFailedTooManyGuesses,
    /// Account credentials issued (code registered, or already registered).
    CodeRegister,
    /// Code registration rejected.
    CodeRegisterFailed,
    /// Credentials check succeeded.
    CredentialsGood,
    /// Credentials check rejected.
    CredentialsBad,
    /// Request never produced a usable response.
    TransportFailed,
}

impl EventName {
    /// Every event name.
    pub const ALL: [EventName; 11] = [
        Self::DissectPhone,
        Self::DissectPhoneFailed,
        Self::CodeRequest,
        Self::CodeRequestFailed,
        Self::CodeRequestFailedTooRecent,
        Self::CodeRequestFailedTooManyGuesses,
        Self::CodeRegister,
        Self::CodeRegisterFailed,
        Self::CredentialsGood,
        Self::CredentialsBad,
        Self::TransportFailed,
    ];

    /// Conventional string name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DissectPhone => "onDissectPhone",
            Self::DissectPhoneFailed => "onDissectPhoneFailed",
            Self::CodeRequest => "onCodeRequest",
            Self::CodeRequestFailed => "onCodeRequestFailed",
            Self::CodeRequestFailedTooRecent => "onCodeRequestFailedTooRecent",
            Self::CodeRequestFailedTooManyGuesses => "onCodeRequestFailedTooManyGuesses",
            Self::CodeRegister => "onCodeRegister",
            Self::CodeRegisterFailed => "onCodeRegisterFailed",
            Self::CredentialsGood => "onCredentialsGood",
            Self::CredentialsBad => "onCredentialsBad",
            Self::TransportFailed => "onTransportFailed",
        }
    }
}

impl Display for EventName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown event name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event name '{0}'")]
pub struct UnknownEventName(pub String);

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}

/// Payload delivered to event handlers.
#[derive(Debug, Clone)]
pub enum RegistrationEvent {
    /// The number matched a country row.
    DissectPhone {
        phone_number: PhoneNumber,
        info: PhoneInfo,
    },
    /// No country row matched the number.
    DissectPhoneFailed {
        phone_number: PhoneNumber,
    },
    /// A verification code was dispatched.
    CodeRequest {
        phone_number: PhoneNumber,
        method: CodeMethod,
        length: Option<u64>,
    },
    /// The code request failed for a reason without a dedicated event.
    CodeRequestFailed {
        phone_number: PhoneNumber,
        method: CodeMethod,
        reason: Option<String>,
        param: Option<String>,
    },
    /// A code was requested too recently.
    CodeRequestFailedTooRecent {
        phone_number: PhoneNumber,
        method: CodeMethod,
        reason: String,
        retry_after: Option<u64>,
    },
    /// Too many wrong codes were tried.
    CodeRequestFailedTooManyGuesses {
        phone_number: PhoneNumber,
        method: CodeMethod,
        reason: String,
        retry_after: Option<u64>,
    },
    /// The number is registered; credentials when the service sent them.
    CodeRegister {
        phone_number: PhoneNumber,
        credentials: Option<Credentials>,
    },
    /// The service rejected the verification code.
    CodeRegisterFailed {
        phone_number: PhoneNumber,
        status: String,
        reason: Option<String>,
        retry_after: Option<u64>,
    },
    /// The stored identity's credentials were accepted.
    CredentialsGood {
        phone_number: PhoneNumber,
        credentials: Credentials,
    },
    /// The stored identity's credentials were rejected.
    CredentialsBad {
        phone_number: PhoneNumber,
        status: String,
        reason: Option<String>,
    },
    /// The exchange failed before a usable response arrived.
    TransportFailed {
        phone_number: PhoneNumber,
        endpoint: Endpoint,
        message: String,
    },
}

impl RegistrationEvent {
    /// Name this event is published under.
    pub fn name(&self) -> EventName {
        match self {
            Self::DissectPhone { .. } => EventName::DissectPhone,
            Self::DissectPhoneFailed { .. } => EventName::DissectPhoneFailed,
            Self::CodeRequest { .. } => EventName::CodeRequest,
            Self::CodeRequestFailed { .. } => EventName::CodeRequestFailed,
            Self::CodeRequestFailedTooRecent { .. } => EventName::CodeRequestFailedTooRecent,
            Self::CodeRequestFailedTooManyGuesses { .. } => {
                EventName::CodeRequestFailedTooManyGuesses
            }
            Self::CodeRegister { .. } => EventName::CodeRegister,
            Self::CodeRegisterFailed { .. } => EventName::CodeRegisterFailed,
            Self::CredentialsGood { .. } => EventName::CredentialsGood,
            Self::CredentialsBad { .. } => EventName::CredentialsBad,
            Self::TransportFailed { .. } => EventName::TransportFailed,
        }
    }

    /// Account the event concerns.
    pub fn phone_number(&self) -> &PhoneNumber {
        match self {
            Self::DissectPhone { phone_number, .. }
            | Self::DissectPhoneFailed { phone_number }
            | Self::CodeRequest { phone_number, .. }
            | Self::CodeRequestFailed { phone_number, .. }
            | Self::CodeRequestFailedTooRecent { phone_number, .. }
            | Self::CodeRequestFailedTooManyGuesses { phone_number, .. }
            | Self::CodeRegister { phone_number, .. }
            | Self::CodeRegisterFailed { phone_number, .. }
            | Self::CredentialsGood { phone_number, .. }
            | Self::CredentialsBad { phone_number, .. }
            | Self::TransportFailed { phone_number, .. } => phone_number,
        }
    }
}

type Handler<R> = Box<dyn Fn(&RegistrationEvent) -> R + Send + Sync>;

/// Handler registry keyed by event name.
///
/// `R` is the handler return type, surfaced by [`publish`](Self::publish).
pub struct EventHub<R = ()> {
    handlers: HashMap<EventName, Vec<Handler<R>>>,
}

impl<R> Default for EventHub<R> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<R> fmt::Debug for EventHub<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<(&'static str, usize)> = self
            .handlers
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        bound.sort_unstable();
        f.debug_struct("EventHub").field("handlers", &bound).finish()
    }
}

impl<R> EventHub<R> {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `name`.
    ///
    /// Handlers are kept in registration order. Only the first one receives
    /// [`publish`](Self::publish) deliveries.
    pub fn subscribe<F>(&mut self, name: EventName, handler: F) -> &mut Self
    where
        F: Fn(&RegistrationEvent) -> R + Send + Sync + 'static,
    {
        self.handlers
            .entry(name)
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Deliver `event` to the first handler bound to its name.
    ///
    /// Returns that handler's result, or `None` when nothing is bound.
    pub fn publish(&self, event: &RegistrationEvent) -> Option<R> {
        let name = event.name();
        let handler = self.handlers.get(&name).and_then(|h| h.first());

        #[cfg(feature = "tracing")]
        trace!(event = %name, bound = handler.is_some(), "Publishing event");

        handler.map(|handler| handler(event))
    }

    /// Deliver `event` to every handler bound to its name, in registration
    /// order, collecting their results.
    pub fn publish_all(&self, event: &RegistrationEvent) -> Vec<R> {
        self.handlers
            .get(&event.name())
            .map(|handlers| handlers.iter().map(|handler| handler(event)).collect())
            .unwrap_or_default()
    }

    /// Number of handlers bound to `name`.
    pub fn handler_count(&self, name: EventName) -> usize {
        self.handlers.get(&name).map_or(0, Vec::len)
    }

    /// Whether any handler is bound to `name`.
    pub fn is_bound(&self, name: EventName) -> bool {
        self.handler_count(name) > 0
    }

    /// Drop every handler bound to `name`.
    pub fn clear(&mut self, name: EventName) {
        self.handlers.remove(&name);
    }
}
