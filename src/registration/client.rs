//! Registration client driving the three-step handshake.

use super::config::RegistrationConfig;
use super::error::{
    RateLimit, RegistrationError, REASON_OLD_VERSION, REASON_TOO_MANY_GUESSES, REASON_TOO_RECENT,
    Stage,
};
use super::outcome::{ClientState, Credentials, RegistrationOutcome};
use super::params;
use super::token::TokenGenerator;
use super::version::{HttpVersionChecker, NoopVersionChecker, VersionChecker};
use crate::events::{EventHub, EventName, RegistrationEvent};
use crate::phone::{PhoneDissector, PhoneInfo};
use crate::tables::ReferenceTables;
use crate::transport::{Endpoint, HttpTransport, QueryParams, ServerResponse, Transport};
use crate::types::{CodeMethod, Identity, PhoneNumber, VerificationCode};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Registration client for one phone number.
///
/// Owns the account's identity and event hub. Operations take `&mut self`,
/// so at most one request per client is in flight. Each operation makes
/// exactly one outbound request and never retries.
///
/// # Type Parameters
///
/// - `T`: The transport implementation (defaults to [`HttpTransport`])
///
/// # Example
///
/// ```rust,ignore
/// use wa_registration::{
///     CodeMethod, EventName, PhoneNumber, ReferenceTables, RegistrationClient,
///     RegistrationConfig, RegistrationOutcome, StaticToken,
/// };
/// use std::sync::Arc;
///
/// let tables = Arc::new(ReferenceTables::load_dir("data")?);
/// let number = PhoneNumber::new("34600111222")?;
/// let mut client = RegistrationClient::connect(
///     number,
///     tables,
///     StaticToken::new("token"),
///     RegistrationConfig::default(),
/// )?;
///
/// client.on(EventName::CodeRequest, |event| println!("{event:?}"));
///
/// match client.request_code(CodeMethod::Sms, None, None).await? {
///     RegistrationOutcome::CodeSent { length, .. } => println!("code of {length:?} digits sent"),
///     RegistrationOutcome::AlreadyRegistered(credentials) => println!("{credentials:?}"),
/// }
///
/// let credentials = client.register_code("123-456").await?;
/// ```
pub struct RegistrationClient<T: Transport = HttpTransport> {
    phone_number: PhoneNumber,
    identity: Identity,
    dissector: PhoneDissector,
    transport: T,
    token_generator: Arc<dyn TokenGenerator>,
    version_checker: Arc<dyn VersionChecker>,
    events: EventHub,
    config: RegistrationConfig,
    state: ClientState,
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for RegistrationClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("phone_number", &self.phone_number)
            .field("identity", &"[REDACTED]")
            .field("transport", &self.transport)
            .field("events", &self.events)
            .field("state", &self.state)
            .finish()
    }
}

impl RegistrationClient<HttpTransport> {
    /// Create a client talking HTTP to the endpoints in `config`.
    ///
    /// `old_version` rejections trigger a background check against the
    /// configured version URL.
    pub fn connect(
        phone_number: PhoneNumber,
        tables: Arc<ReferenceTables>,
        token_generator: impl TokenGenerator + 'static,
        config: RegistrationConfig,
    ) -> Result<Self, RegistrationError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        let version_checker = HttpVersionChecker::from_config(&config)?;

        Ok(Self::new(phone_number, tables, transport, token_generator, config)?
            .with_version_checker(version_checker))
    }
}

impl<T: Transport> RegistrationClient<T> {
    /// Create a client over a custom transport.
    ///
    /// Loads the stored identity for `phone_number`, creating and persisting
    /// a new one on first use. Version checks are disabled until
    /// [`with_version_checker`](Self::with_version_checker) is called.
    pub fn new(
        phone_number: PhoneNumber,
        tables: Arc<ReferenceTables>,
        transport: T,
        token_generator: impl TokenGenerator + 'static,
        config: RegistrationConfig,
    ) -> Result<Self, RegistrationError> {
        config.validate()?;
        let identity = config.identity_store().get_or_create(&phone_number)?;

        #[cfg(feature = "tracing")]
        debug!(phone_number = %phone_number, "Registration client ready");

        Ok(Self {
            phone_number,
            identity,
            dissector: PhoneDissector::new(tables),
            transport,
            token_generator: Arc::new(token_generator),
            version_checker: Arc::new(NoopVersionChecker),
            events: EventHub::new(),
            config,
            state: ClientState::IdentityReady,
        })
    }

    /// Replace the version checker run after `old_version` rejections.
    pub fn with_version_checker(mut self, checker: impl VersionChecker + 'static) -> Self {
        self.version_checker = Arc::new(checker);
        self
    }

    /// Account this client registers.
    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Identity sent with every request.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Last step completed successfully.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Get reference to the client configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Get reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get reference to the event hub.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Get mutable reference to the event hub.
    pub fn events_mut(&mut self) -> &mut EventHub {
        &mut self.events
    }

    /// Subscribe `handler` to `name`.
    ///
    /// Only the first handler bound to a name is invoked on publish.
    pub fn on<F>(&mut self, name: EventName, handler: F) -> &mut Self
    where
        F: Fn(&RegistrationEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(name, handler);
        self
    }

    /// Dissect the account's phone number, publishing the outcome.
    pub fn dissect_phone(&self) -> Result<PhoneInfo, RegistrationError> {
        self.dissector
            .dissect(&self.phone_number, &self.events)
            .ok_or_else(|| RegistrationError::InvalidPhoneNumber {
                number: self.phone_number.clone(),
            })
    }

    /// Request a verification code.
    ///
    /// `carrier` selects the network code from the carrier table (falling
    /// back to "000" when unknown); without it the country's default
    /// network code is sent. `platform` defaults to the configured one.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "RegistrationClient::request_code",
            skip_all,
            fields(phone_number = %self.phone_number, method = %method)
        )
    )]
    pub async fn request_code(
        &mut self,
        method: CodeMethod,
        carrier: Option<&str>,
        platform: Option<&str>,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let info = self.dissect_phone()?;

        let mnc = match carrier {
            Some(carrier) => {
                let lc = info.locale_country_code().to_ascii_lowercase();
                self.dissector.tables().lookup_carrier(&lc, carrier).to_string()
            }
            None => info.mobile_network_code.clone(),
        };

        let platform = platform.unwrap_or(&self.config.platform);
        let token =
            self.token_generator
                .request_token(&info.country, &info.national_number, platform);

        let query = params::code_request(&info, &self.identity, &token, &mnc, method);
        let response = self.exchange(Endpoint::Code, &query).await?;

        if response.is_ok() {
            let credentials = Credentials::from_response(&response).ok();
            self.publish(RegistrationEvent::CodeRegister {
                phone_number: self.phone_number.clone(),
                credentials: credentials.clone(),
            });
            self.state = ClientState::Registered;

            #[cfg(feature = "tracing")]
            info!(
                has_credentials = credentials.is_some(),
                "Number is already registered"
            );

            return Ok(RegistrationOutcome::AlreadyRegistered(credentials));
        }

        if response.is_sent() {
            self.publish(RegistrationEvent::CodeRequest {
                phone_number: self.phone_number.clone(),
                method,
                length: response.length,
            });
            self.state = ClientState::CodeRequested;

            #[cfg(feature = "tracing")]
            info!(length = ?response.length, "Verification code sent");

            let sent_method = response
                .method
                .as_deref()
                .and_then(|m| m.parse().ok())
                .unwrap_or(method);
            return Ok(RegistrationOutcome::CodeSent {
                length: response.length,
                method: sent_method,
            });
        }

        Err(self.code_request_failure(method, response))
    }

    fn code_request_failure(&self, method: CodeMethod, response: ServerResponse) -> RegistrationError {
        let retry_after = response.retry_after.map(Duration::from_secs);

        #[cfg(feature = "tracing")]
        warn!(
            status = %response.status,
            reason = ?response.reason,
            retry_after = ?response.retry_after,
            "Code request failed"
        );

        let limit = match response.reason.as_deref() {
            Some(REASON_TOO_RECENT) => Some(RateLimit::TooRecent),
            Some(REASON_TOO_MANY_GUESSES) => Some(RateLimit::TooManyGuesses),
            _ => None,
        };

        match limit {
            Some(limit) => {
                let phone_number = self.phone_number.clone();
                let reason = limit.reason().to_string();
                let retry_secs = response.retry_after;
                self.publish(match limit {
                    RateLimit::TooRecent => RegistrationEvent::CodeRequestFailedTooRecent {
                        phone_number,
                        method,
                        reason,
                        retry_after: retry_secs,
                    },
                    RateLimit::TooManyGuesses => {
                        RegistrationEvent::CodeRequestFailedTooManyGuesses {
                            phone_number,
                            method,
                            reason,
                            retry_after: retry_secs,
                        }
                    }
                });
                RegistrationError::RateLimited { limit, retry_after }
            }
            None => {
                self.publish(RegistrationEvent::CodeRequestFailed {
                    phone_number: self.phone_number.clone(),
                    method,
                    reason: response.reason.clone(),
                    param: response.param.clone(),
                });
                RegistrationError::Protocol {
                    stage: Stage::CodeRequest,
                    status: response.status,
                    reason: response.reason,
                    retry_after,
                    param: response.param,
                }
            }
        }
    }

    /// Redeem a verification code for credentials.
    ///
    /// Hyphens in `code` are ignored. On an `old_version` rejection a
    /// version check is started in the background before the error is
    /// returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "RegistrationClient::register_code",
            skip_all,
            fields(phone_number = %self.phone_number)
        )
    )]
    pub async fn register_code(
        &mut self,
        code: impl Into<VerificationCode>,
    ) -> Result<Credentials, RegistrationError> {
        let code = code.into();
        let info = self.dissect_phone()?;

        let query = params::code_register(&info, &self.identity, &code);
        let response = self.exchange(Endpoint::Register, &query).await?;

        if !response.is_ok() {
            #[cfg(feature = "tracing")]
            warn!(status = %response.status, reason = ?response.reason, "Code register failed");

            self.publish(RegistrationEvent::CodeRegisterFailed {
                phone_number: self.phone_number.clone(),
                status: response.status.clone(),
                reason: response.reason.clone(),
                retry_after: response.retry_after,
            });

            if response.has_reason(REASON_OLD_VERSION) {
                self.version_checker.check_version();
            }

            return Err(RegistrationError::Protocol {
                stage: Stage::CodeRegister,
                status: response.status,
                reason: response.reason,
                retry_after: response.retry_after.map(Duration::from_secs),
                param: response.param,
            });
        }

        let credentials = self.credentials_from(Endpoint::Register, &response)?;
        self.publish(RegistrationEvent::CodeRegister {
            phone_number: self.phone_number.clone(),
            credentials: Some(credentials.clone()),
        });
        self.state = ClientState::Registered;

        #[cfg(feature = "tracing")]
        info!(login = %credentials.login, "Code registered");

        Ok(credentials)
    }

    /// Check the stored identity's credentials.
    ///
    /// The service issues a new password on every successful check; the
    /// returned credentials replace any previously stored ones.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "RegistrationClient::check_credentials",
            skip_all,
            fields(phone_number = %self.phone_number)
        )
    )]
    pub async fn check_credentials(&mut self) -> Result<Credentials, RegistrationError> {
        let info = self.dissect_phone()?;

        let query = params::credentials_check(&info, &self.identity);
        let response = self.exchange(Endpoint::Exist, &query).await?;

        if !response.is_ok() {
            #[cfg(feature = "tracing")]
            warn!(status = %response.status, reason = ?response.reason, "Credentials rejected");

            self.publish(RegistrationEvent::CredentialsBad {
                phone_number: self.phone_number.clone(),
                status: response.status.clone(),
                reason: response.reason.clone(),
            });

            return Err(RegistrationError::Protocol {
                stage: Stage::CredentialsCheck,
                status: response.status,
                reason: response.reason,
                retry_after: response.retry_after.map(Duration::from_secs),
                param: response.param,
            });
        }

        let credentials = self.credentials_from(Endpoint::Exist, &response)?;
        self.publish(RegistrationEvent::CredentialsGood {
            phone_number: self.phone_number.clone(),
            credentials: credentials.clone(),
        });
        self.state = ClientState::CredentialsChecked;

        Ok(credentials)
    }

    /// Send one request, publishing `onTransportFailed` on error.
    async fn exchange(
        &self,
        endpoint: Endpoint,
        query: &QueryParams,
    ) -> Result<ServerResponse, RegistrationError> {
        #[cfg(feature = "tracing")]
        debug!(endpoint = %endpoint, params = %query.redacted(), "Sending request");

        match self.transport.send(endpoint, query).await {
            Ok(response) => {
                #[cfg(feature = "tracing")]
                debug!(
                    endpoint = %endpoint,
                    status = %response.status,
                    reason = ?response.reason,
                    "Received response"
                );
                Ok(response)
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(endpoint = %endpoint, error = %e, "Request failed");

                self.publish(RegistrationEvent::TransportFailed {
                    phone_number: self.phone_number.clone(),
                    endpoint,
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Credentials of an `ok` response; a missing field is a transport
    /// failure.
    fn credentials_from(
        &self,
        endpoint: Endpoint,
        response: &ServerResponse,
    ) -> Result<Credentials, RegistrationError> {
        Credentials::from_response(response).map_err(|e| {
            self.publish(RegistrationEvent::TransportFailed {
                phone_number: self.phone_number.clone(),
                endpoint,
                message: e.to_string(),
            });
            e.into()
        })
    }

    fn publish(&self, event: RegistrationEvent) {
        self.events.publish(&event);
    }
}
