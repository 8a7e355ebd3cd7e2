//! HTTP transport for the registration service.

use super::errors::TransportError;
use super::query::QueryParams;
use super::response::ServerResponse;
use super::{Endpoint, Transport};
use crate::registration::config::{
    DEFAULT_CODE_URL, DEFAULT_EXIST_URL, DEFAULT_REGISTER_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    RegistrationConfig,
};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, debug};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Value of the `Accept` header the service expects.
pub const ACCEPT_JSON: &str = "text/json";

/// HTTP transport sending GET requests to the three service endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use wa_registration::transport::HttpTransport;
/// use url::Url;
///
/// let transport = HttpTransport::builder()
///     .code_url(Url::parse("http://localhost:8080/v2/code")?)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    http_client: ClientWithMiddleware,
    code_url: Url,
    register_url: Url,
    exist_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("code_url", &self.code_url.as_str())
            .field("register_url", &self.register_url.as_str())
            .field("exist_url", &self.exist_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for configuring an [`HttpTransport`].
#[derive(Default)]
pub struct HttpTransportBuilder {
    code_url: Option<Url>,
    register_url: Option<Url>,
    exist_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    http_client: Option<ClientWithMiddleware>,
}

impl HttpTransportBuilder {
    /// Create a builder with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the code request endpoint.
    pub fn code_url(mut self, url: Url) -> Self {
        self.code_url = Some(url);
        self
    }

    /// Set the code register endpoint.
    pub fn register_url(mut self, url: Url) -> Self {
        self.register_url = Some(url);
        self
    }

    /// Set the credential check endpoint.
    pub fn exist_url(mut self, url: Url) -> Self {
        self.exist_url = Some(url);
        self
    }

    /// Set the User-Agent header sent on every request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`HttpTransport`].
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(TransportError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(HttpTransport {
            http_client,
            code_url: self
                .code_url
                .unwrap_or_else(|| Url::parse(DEFAULT_CODE_URL).expect("Invalid default URL")),
            register_url: self
                .register_url
                .unwrap_or_else(|| Url::parse(DEFAULT_REGISTER_URL).expect("Invalid default URL")),
            exist_url: self
                .exist_url
                .unwrap_or_else(|| Url::parse(DEFAULT_EXIST_URL).expect("Invalid default URL")),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout,
        })
    }
}

impl HttpTransport {
    /// Create a builder for configuring the transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Create a transport from the endpoints, User-Agent and timeout of
    /// `config`.
    pub fn from_config(config: &RegistrationConfig) -> Result<Self, TransportError> {
        Self::builder()
            .code_url(config.code_url.clone())
            .register_url(config.register_url.clone())
            .exist_url(config.exist_url.clone())
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
    }

    /// URL of `endpoint`.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Code => &self.code_url,
            Endpoint::Register => &self.register_url,
            Endpoint::Exist => &self.exist_url,
        }
    }

    fn build_request_url(&self, endpoint: Endpoint, query: &QueryParams) -> Result<Url, TransportError> {
        let mut url = self.endpoint_url(endpoint).clone();
        let encoded = query
            .to_query_string()
            .map_err(TransportError::BuildRequestUrl)?;
        url.set_query(Some(&encoded));
        Ok(url)
    }

    /// Send a GET request and return the response text.
    async fn send_request(&self, url: Url) -> Result<String, TransportError> {
        let response = self
            .http_client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_JSON)
            .timeout(self.timeout)
            .send()
            .await?;

        #[cfg(feature = "tracing")]
        debug!(http_status = response.status().as_u16(), "Received response");

        response.text().await.map_err(TransportError::ReadBody)
    }
}

impl Transport for HttpTransport {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HttpTransport::send",
            skip_all,
            fields(endpoint = %endpoint, status = tracing::field::Empty)
        )
    )]
    async fn send(
        &self,
        endpoint: Endpoint,
        query: &QueryParams,
    ) -> Result<ServerResponse, TransportError> {
        let url = self.build_request_url(endpoint, query)?;
        let text = self.send_request(url).await?;
        let response = ServerResponse::from_text(&text)?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("status", response.status.as_str())
                .set_status(Status::Ok);
        }

        Ok(response)
    }
}
