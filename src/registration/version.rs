//! Client version checks after an `old_version` rejection.

use super::config::RegistrationConfig;
use crate::transport::TransportError;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Reacts to the service reporting the client version as outdated.
///
/// Implementations must return immediately; any network work runs in the
/// background and its failures are only logged.
pub trait VersionChecker: Send + Sync {
    /// Start a version check.
    fn check_version(&self);
}

/// Version checker that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVersionChecker;

impl VersionChecker for NoopVersionChecker {
    fn check_version(&self) {}
}

/// Latest client release as published by the version endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionInfo {
    /// Latest client version.
    #[serde(rename = "d")]
    pub version: String,
    /// Token material of that release.
    #[serde(rename = "a", default)]
    pub token_data: Option<String>,
}

/// Fetches the latest version over HTTP on a background task.
#[derive(Clone)]
pub struct HttpVersionChecker {
    http_client: ClientWithMiddleware,
    url: Url,
    client_version: String,
}

impl std::fmt::Debug for HttpVersionChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVersionChecker")
            .field("url", &self.url.as_str())
            .field("client_version", &self.client_version)
            .finish()
    }
}

impl HttpVersionChecker {
    /// Create a checker comparing `client_version` against `url`.
    pub fn new(
        url: Url,
        client_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::BuildHttpClient)?;

        Ok(Self {
            http_client: ClientBuilder::new(client).build(),
            url,
            client_version: client_version.into(),
        })
    }

    /// Create a checker from the version URL, client version and timeout of
    /// `config`.
    pub fn from_config(config: &RegistrationConfig) -> Result<Self, TransportError> {
        Self::new(
            config.version_check_url.clone(),
            config.client_version.clone(),
            config.timeout,
        )
    }

    /// Replace the HTTP client.
    pub fn with_http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = client;
        self
    }

    /// Fetch the latest published version.
    pub async fn fetch_latest(&self) -> Result<VersionInfo, TransportError> {
        let response = self.http_client.get(self.url.clone()).send().await?;
        let text = response.text().await.map_err(TransportError::ReadBody)?;
        serde_json::from_str(&text).map_err(TransportError::DeserializeJson)
    }

    /// Fetch the latest version and return it when it differs from ours.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HttpVersionChecker::check",
            skip_all,
            fields(client_version = %self.client_version)
        )
    )]
    pub async fn check(&self) -> Result<Option<VersionInfo>, TransportError> {
        let latest = self.fetch_latest().await?;

        if latest.version == self.client_version {
            #[cfg(feature = "tracing")]
            debug!("Client version is current");
            return Ok(None);
        }

        #[cfg(feature = "tracing")]
        warn!(
            latest = %latest.version,
            token_data = latest.token_data.as_deref().unwrap_or_default(),
            "Client version is outdated, update the token generator and client version"
        );

        Ok(Some(latest))
    }
}

impl VersionChecker for HttpVersionChecker {
    fn check_version(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            #[cfg(feature = "tracing")]
            info!("No async runtime available, skipping version check");
            return;
        };

        let checker = self.clone();
        handle.spawn(async move {
            if let Err(_e) = checker.check().await {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Version check failed");
            }
        });
    }
}
