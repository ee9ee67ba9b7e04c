//! Connector configuration.

use secrecy::SecretString;
use url::Url;

use crate::error::{TfcError, TfcResult};
use crate::retry::RetryConfig;

/// Default Terraform Cloud API origin.
pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default (and maximum) page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Credentials for the Terraform Cloud API.
#[derive(Clone)]
pub struct TfcCredentials {
    /// User or team API token, sent as a bearer token.
    pub api_token: SecretString,
}

impl std::fmt::Debug for TfcCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfcCredentials")
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl TfcCredentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: SecretString::new(api_token.into()),
        }
    }
}

/// Configuration for the Terraform Cloud connector.
#[derive(Debug, Clone)]
pub struct TfcConfig {
    /// API origin. Terraform Enterprise installs use their own host.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Page size requested from list endpoints (1..=100).
    pub page_size: u32,
    /// Retry policy for transient request failures.
    pub retry: RetryConfig,
}

impl Default for TfcConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryConfig::default(),
        }
    }
}

impl TfcConfig {
    /// Create a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API origin (Terraform Enterprise installs).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Override the list page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TfcResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| TfcError::Config(format!("invalid base_url: {e}")))?;
        if url.host_str().is_none() {
            return Err(TfcError::Config("base_url has no host".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(TfcError::Config(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > DEFAULT_PAGE_SIZE {
            return Err(TfcError::Config(format!(
                "page_size must be in 1..={DEFAULT_PAGE_SIZE}"
            )));
        }
        self.retry.validate().map_err(TfcError::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TfcConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = TfcConfig::default().with_base_url("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        assert!(TfcConfig::default().with_page_size(0).validate().is_err());
        assert!(TfcConfig::default().with_page_size(101).validate().is_err());
        assert!(TfcConfig::default().with_page_size(50).validate().is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(TfcConfig::default()
            .with_request_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn credentials_debug_does_not_leak_token() {
        let creds = TfcCredentials::new("tfc-secret-token");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("tfc-secret-token"));
        assert!(rendered.contains("REDACTED"));
    }
}
