//! Provider configuration.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;

/// Where the LogDNA API lives unless configured otherwise.
pub const DEFAULT_API_URL: &str = "https://api.logdna.com";

/// The `provider` block: credentials and API host.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Service key sent in the `servicekey` header.
    pub servicekey: String,
    /// API host; [`DEFAULT_API_URL`] when unset.
    #[serde(default)]
    pub url: Option<String>,
}

impl ProviderConfig {
    /// Create a configuration for the default API host.
    pub fn new(servicekey: impl Into<String>) -> Self {
        Self {
            servicekey: servicekey.into(),
            url: None,
        }
    }

    /// Point the provider at another API host.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Decode the provider block sent by the host.
    pub fn from_value(config: Value) -> Result<Self, ProviderError> {
        let config: Self = serde_json::from_value(config)
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;
        if config.servicekey.is_empty() {
            return Err(ProviderError::Configuration(
                "servicekey must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// The configured API host, or the default.
    pub fn api_url(&self) -> &str {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_API_URL,
        }
    }

    /// The API host as a base for joining request paths.
    ///
    /// Always ends in `/` so joined paths are appended, never substituted.
    pub fn base_url(&self) -> Result<Url, ProviderError> {
        let mut url = Url::parse(self.api_url())
            .map_err(|e| ProviderError::Configuration(format!("invalid url: {}", e)))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("servicekey", &"<redacted>")
            .field("url", &self.api_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_url() {
        let config = ProviderConfig::from_value(json!({"servicekey": "abc"})).unwrap();
        assert_eq!(config.api_url(), "https://api.logdna.com");
        assert_eq!(config.base_url().unwrap().as_str(), "https://api.logdna.com/");

        let config = ProviderConfig::from_value(json!({"servicekey": "abc", "url": null})).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_custom_url_keeps_prefix() {
        let config = ProviderConfig::new("abc").with_url("https://logs.example.com/api");
        let base = config.base_url().unwrap();
        assert_eq!(
            base.join("v1/config/view").unwrap().as_str(),
            "https://logs.example.com/api/v1/config/view"
        );
    }

    #[test]
    fn test_invalid_config() {
        let err = ProviderConfig::from_value(json!({"url": "https://api.logdna.com"})).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));

        let err = ProviderConfig::from_value(json!({"servicekey": ""})).unwrap_err();
        assert!(err.to_string().contains("servicekey must not be empty"));

        let err = ProviderConfig::new("abc").with_url("not a url").base_url().unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: invalid url"));
    }

    #[test]
    fn test_debug_redacts_servicekey() {
        let debug = format!("{:?}", ProviderConfig::new("super-secret"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
