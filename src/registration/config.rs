//! Registration client configuration.

use crate::identity::IdentityStore;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default code request endpoint.
pub const DEFAULT_CODE_URL: &str = "https://v.whatsapp.net/v2/code";

/// Default code register endpoint.
pub const DEFAULT_REGISTER_URL: &str = "https://v.whatsapp.net/v2/register";

/// Default credential check endpoint.
pub const DEFAULT_EXIST_URL: &str = "https://v.whatsapp.net/v2/exist";

/// Default endpoint publishing the latest client version.
pub const DEFAULT_VERSION_CHECK_URL: &str = "https://coderus.openrepos.net/whitesoft/whatsapp_scratch";

/// Client version the request token and User-Agent are pinned to.
pub const DEFAULT_CLIENT_VERSION: &str = "2.18.302";

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "WhatsApp/2.16.148 Android/4.3 Device/Xiaomi-HM_1SW";

/// Default platform passed to the token generator.
pub const DEFAULT_PLATFORM: &str = "Android";

/// Default directory holding identity files.
pub const DEFAULT_DATA_DIR: &str = "wadata";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Endpoint URL is not HTTP or HTTPS.
    #[error("{name} must use http or https, got '{url}'")]
    UnsupportedScheme { name: &'static str, url: Url },

    /// Timeout of zero.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    /// Endpoint URL could not be parsed or joined.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Configuration for the [`RegistrationClient`](super::RegistrationClient).
///
/// Defaults reproduce the production service.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Code request endpoint.
    pub code_url: Url,
    /// Code register endpoint.
    pub register_url: Url,
    /// Credential check endpoint.
    pub exist_url: Url,
    /// Endpoint queried for the latest client version after `old_version`.
    pub version_check_url: Url,
    /// Client version this crate speaks for.
    pub client_version: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory holding `id.<number>.dat` files.
    pub data_dir: PathBuf,
    /// Explicit identity location (a directory or a file), overriding
    /// `data_dir`.
    pub identity_location: Option<PathBuf>,
    /// Platform passed to the token generator when none is given.
    pub platform: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        RegistrationConfigBuilder::default().build()
    }
}

impl RegistrationConfig {
    /// Create a new builder for RegistrationConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use wa_registration::RegistrationConfig;
    /// use std::time::Duration;
    ///
    /// let config = RegistrationConfig::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .data_dir("/var/lib/wa")
    ///     .build();
    ///
    /// assert_eq!(config.timeout, Duration::from_secs(10));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn builder() -> RegistrationConfigBuilder {
        RegistrationConfigBuilder::default()
    }

    /// Point all three endpoints at `<base>/v2/{code,register,exist}`.
    pub fn with_api_base(mut self, base: &str) -> Result<Self, ConfigError> {
        let invalid = |source: url::ParseError| ConfigError::InvalidUrl {
            url: base.to_string(),
            source,
        };
        let root = Url::parse(base).map_err(invalid)?;
        self.code_url = root.join("v2/code").map_err(invalid)?;
        self.register_url = root.join("v2/register").map_err(invalid)?;
        self.exist_url = root.join("v2/exist").map_err(invalid)?;
        Ok(self)
    }

    /// Use a custom request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Use an explicit identity location.
    pub fn with_identity_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.identity_location = Some(location.into());
        self
    }

    /// Use a custom version-check endpoint.
    pub fn with_version_check_url(mut self, url: Url) -> Self {
        self.version_check_url = url;
        self
    }

    /// Identity store for this configuration's data directory and location.
    pub fn identity_store(&self) -> IdentityStore {
        let store = IdentityStore::new(&self.data_dir);
        match &self.identity_location {
            Some(location) => store.with_location(location),
            None => store,
        }
    }

    /// Check that endpoints are HTTP(S) and the timeout is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("code_url", &self.code_url),
            ("register_url", &self.register_url),
            ("exist_url", &self.exist_url),
            ("version_check_url", &self.version_check_url),
        ];
        for (name, url) in endpoints {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme {
                    name,
                    url: url.clone(),
                });
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Builder for RegistrationConfig.
#[derive(Debug, Clone)]
pub struct RegistrationConfigBuilder {
    code_url: Url,
    register_url: Url,
    exist_url: Url,
    version_check_url: Url,
    client_version: String,
    user_agent: String,
    timeout: Duration,
    data_dir: PathBuf,
    identity_location: Option<PathBuf>,
    platform: String,
}

impl Default for RegistrationConfigBuilder {
    fn default() -> Self {
        Self {
            code_url: Url::parse(DEFAULT_CODE_URL).expect("Invalid default URL"),
            register_url: Url::parse(DEFAULT_REGISTER_URL).expect("Invalid default URL"),
            exist_url: Url::parse(DEFAULT_EXIST_URL).expect("Invalid default URL"),
            version_check_url: Url::parse(DEFAULT_VERSION_CHECK_URL)
                .expect("Invalid default URL"),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            identity_location: None,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

impl RegistrationConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the code request endpoint.
    pub fn code_url(mut self, url: Url) -> Self {
        self.code_url = url;
        self
    }

    /// Set the code register endpoint.
    pub fn register_url(mut self, url: Url) -> Self {
        self.register_url = url;
        self
    }

    /// Set the credential check endpoint.
    pub fn exist_url(mut self, url: Url) -> Self {
        self.exist_url = url;
        self
    }

    /// Set the version-check endpoint.
    pub fn version_check_url(mut self, url: Url) -> Self {
        self.version_check_url = url;
        self
    }

    /// Set the pinned client version.
    ///
    /// Default: "2.18.302"
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the identity data directory.
    ///
    /// Default: "wadata"
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set an explicit identity location.
    pub fn identity_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.identity_location = Some(location.into());
        self
    }

    /// Set the default platform.
    ///
    /// Default: "Android"
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Build the RegistrationConfig.
    pub fn build(self) -> RegistrationConfig {
        RegistrationConfig {
            code_url: self.code_url,
            register_url: self.register_url,
            exist_url: self.exist_url,
            version_check_url: self.version_check_url,
            client_version: self.client_version,
            user_agent: self.user_agent,
            timeout: self.timeout,
            data_dir: self.data_dir,
            identity_location: self.identity_location,
            platform: self.platform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RegistrationConfig::default();
        assert_eq!(config.code_url.as_str(), DEFAULT_CODE_URL);
        assert_eq!(config.register_url.as_str(), DEFAULT_REGISTER_URL);
        assert_eq!(config.exist_url.as_str(), DEFAULT_EXIST_URL);
        assert_eq!(config.client_version, "2.18.302");
        assert_eq!(config.platform, "Android");
        assert_eq!(config.data_dir, PathBuf::from("wadata"));
        assert!(config.identity_location.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_identity_store_paths() {
        let number = crate::PhoneNumber::new("34600111222").unwrap();

        let store = RegistrationConfig::default().with_data_dir("ids").identity_store();
        assert_eq!(store.path_for(&number), PathBuf::from("ids").join("id.34600111222.dat"));

        let store = RegistrationConfig::default()
            .with_identity_location("/nonexistent/custom.id")
            .identity_store();
        assert_eq!(store.path_for(&number), PathBuf::from("/nonexistent/custom.id"));
    }

    #[test]
    fn test_config_builder() {
        let config = RegistrationConfig::builder()
            .client_version("2.19.0")
            .platform("S40")
            .identity_location("/tmp/ids")
            .build();

        assert_eq!(config.client_version, "2.19.0");
        assert_eq!(config.platform, "S40");
        assert_eq!(config.identity_location, Some(PathBuf::from("/tmp/ids")));
    }

    #[test]
    fn test_with_api_base() {
        let config = RegistrationConfig::default()
            .with_api_base("http://127.0.0.1:9000/")
            .unwrap();

        assert_eq!(config.code_url.as_str(), "http://127.0.0.1:9000/v2/code");
        assert_eq!(config.register_url.as_str(), "http://127.0.0.1:9000/v2/register");
        assert_eq!(config.exist_url.as_str(), "http://127.0.0.1:9000/v2/exist");
    }

    #[test]
    fn test_with_api_base_invalid() {
        let err = RegistrationConfig::default()
            .with_api_base("not a url")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_validate_rejects_scheme() {
        let config = RegistrationConfig::builder()
            .exist_url(Url::parse("ftp://example.com/v2/exist").unwrap())
            .build();

        match config.validate() {
            Err(ConfigError::UnsupportedScheme { name, .. }) => assert_eq!(name, "exist_url"),
            other => panic!("Expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = RegistrationConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }
}
