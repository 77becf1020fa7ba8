//! Application configuration
//!
//! Loaded from an optional `eutils.toml` (or an explicit file) and
//! `EUTILS_*` environment variables. Nested keys use a double underscore,
//! e.g. `EUTILS_CACHE__MAX_AGE_DAYS=7`.
//!
//! Split into focused sub-modules:
//! - `cache`: response cache and batch settings
//! - `logging`: log filter and output format

mod cache;
mod logging;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use application::{ApplicationError, validate_chunk_size};
use domain::ContactEmail;
use integration_eutils::EutilsConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub use cache::{BatchConfig, CacheConfig};
pub use logging::LoggingConfig;

use crate::adapters::Credentials;
use crate::retry::RetryConfig;

/// Name of the optional configuration file (without extension)
const CONFIG_FILE: &str = "eutils";

/// Prefix of configuration environment variables
const ENV_PREFIX: &str = "EUTILS";

const fn default_true() -> bool {
    true
}

fn default_tool() -> String {
    "ncbi-eutils".to_string()
}

/// Complete client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Contact email sent with every request (required by NCBI)
    #[serde(default)]
    pub email: Option<String>,

    /// NCBI API key; raises the rate ceiling to 10 requests/second
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Value of the `tool` parameter
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Override for the requests/second ceiling
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Upper bound on one request including all retries, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub eutils: EutilsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            email: None,
            api_key: None,
            tool: default_tool(),
            requests_per_second: None,
            request_timeout_secs: None,
            eutils: EutilsConfig::default(),
            cache: CacheConfig::default(),
            batch: BatchConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("email", &self.email)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("tool", &self.tool)
            .field("requests_per_second", &self.requests_per_second)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("eutils", &self.eutils)
            .field("cache", &self.cache)
            .field("batch", &self.batch)
            .field("retry", &self.retry)
            .field("logging", &self.logging)
            .finish()
    }
}

impl AppConfig {
    /// Load from `eutils.toml` in the working directory (if present) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required when given) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or a source cannot be parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Check the configuration before any I/O
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.contact_email()?;

        if self.tool.trim().is_empty() {
            return Err(ApplicationError::Configuration(
                "tool name must not be empty".to_string(),
            ));
        }
        if self.requests_per_second == Some(0) {
            return Err(ApplicationError::Configuration(
                "requests_per_second must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ApplicationError::Configuration(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.cache.max_age_days == 0 {
            return Err(ApplicationError::Configuration(
                "cache.max_age_days must be greater than 0".to_string(),
            ));
        }

        self.eutils
            .validate()
            .map_err(ApplicationError::Configuration)?;
        self.retry.validate().map_err(ApplicationError::Configuration)?;
        validate_chunk_size(self.batch.chunk_size)
    }

    /// Validated contact email
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] if the email is missing or malformed.
    pub fn contact_email(&self) -> Result<ContactEmail, ApplicationError> {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                ApplicationError::Configuration(format!(
                    "a contact email is required (set `email` or {ENV_PREFIX}_EMAIL)"
                ))
            })?;

        ContactEmail::new(email).map_err(|e| ApplicationError::Configuration(e.to_string()))
    }

    /// Credentials appended to every outbound request
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] if the email is missing or malformed.
    pub fn credentials(&self) -> Result<Credentials, ApplicationError> {
        Ok(Credentials::new(
            self.contact_email()?,
            self.api_key.clone(),
            self.tool.clone(),
        ))
    }

    /// Overall request budget, if configured
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            email: Some("dev@example.org".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tool, "ncbi-eutils");
        assert_eq!(config.cache.max_age_days, 30);
        assert_eq!(config.batch.chunk_size, 100);
        assert_eq!(config.eutils.timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn missing_email_is_configuration_error() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, ApplicationError::Configuration(_)));
        assert!(AppConfig::default().credentials().is_err());
    }

    #[test]
    fn blank_or_invalid_email_rejected() {
        let mut config = valid();
        config.email = Some("   ".to_string());
        assert!(config.validate().is_err());
        config.email = Some("not-an-email".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = valid();
        config.batch.chunk_size = 501;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.requests_per_second = Some(0);
        assert!(config.validate().is_err());

        let mut config = valid();
        config.cache.max_age_days = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.eutils.base_url = "eutils.ncbi.nlm.nih.gov".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some(SecretString::from("super-secret-key")),
            ..valid()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-key"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
email = "Lab@Example.org"
api_key = "abc123"
request_timeout_secs = 90

[cache]
path = "/tmp/eutils-test.db"
max_age_days = 7

[batch]
chunk_size = 200

[retry]
max_retries = 5
"#
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.email.as_deref(), Some("Lab@Example.org"));
        assert_eq!(
            config.api_key.as_ref().map(ExposeSecret::expose_secret),
            Some("abc123")
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.cache.resolved_path(), "/tmp/eutils-test.db");
        assert_eq!(config.cache.max_age_days, 7);
        assert_eq!(config.batch.chunk_size, 200);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.email().as_str(), "lab@example.org");
        assert!(credentials.has_api_key());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        assert!(AppConfig::load_from(Some(Path::new("/nonexistent/eutils.toml"))).is_err());
    }
}
