//! Results of the handshake steps.

use crate::transport::{ServerResponse, TransportError};
use crate::types::CodeMethod;
use secrecy::{ExposeSecret, SecretString};

/// Account credentials returned by the register and check steps.
///
/// The service rotates the password on every credentials check; persist
/// the latest one.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account login (the full phone number).
    pub login: String,
    /// Account password.
    pub password: SecretString,
    /// Account type (`type` on the wire).
    pub account_type: Option<String>,
    /// Expiration as a UNIX timestamp.
    pub expiration: Option<i64>,
    pub kind: Option<String>,
    /// Price formatted for display (`price` on the wire).
    pub formatted_price: Option<String>,
    /// Decimal price.
    pub cost: Option<String>,
    pub currency: Option<String>,
    /// Price expiration as a UNIX timestamp.
    pub price_expiration: Option<i64>,
}

impl Credentials {
    /// Extract credentials from a successful response.
    ///
    /// `login` and `pw` are required.
    pub fn from_response(response: &ServerResponse) -> Result<Self, TransportError> {
        let login = ServerResponse::require(&response.login, "login")?;
        let password = ServerResponse::require(&response.pw, "pw")?;

        Ok(Self {
            login: login.to_string(),
            password: SecretString::from(password.to_string()),
            account_type: response.account_type.clone(),
            expiration: response.expiration,
            kind: response.kind.clone(),
            formatted_price: response.price.clone(),
            cost: response.cost.clone(),
            currency: response.currency.clone(),
            price_expiration: response.price_expiration,
        })
    }

    /// Password in clear text.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Result of a successful code request.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    /// A code was dispatched.
    CodeSent {
        /// Number of digits of the code, when reported.
        length: Option<u64>,
        /// Delivery method the service used.
        method: CodeMethod,
    },
    /// The number is already registered to this identity; no code is
    /// needed. Credentials are present when the service included them.
    AlreadyRegistered(Option<Credentials>),
}

impl RegistrationOutcome {
    /// Credentials, if the number turned out to be registered already.
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            Self::AlreadyRegistered(credentials) => credentials.as_ref(),
            Self::CodeSent { .. } => None,
        }
    }
}

/// Last step the client completed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Identity loaded or created; no request made yet.
    IdentityReady,
    /// A verification code was dispatched.
    CodeRequested,
    /// Credentials were obtained by registering (or were already present on
    /// a code request).
    Registered,
    /// Credentials were confirmed by a check.
    CredentialsChecked,
}
