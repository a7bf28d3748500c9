//! Client configuration for the remote highlight store.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Bound on the document-open fetch-and-merge call.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on individual create/delete mirror attempts.
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on the connectivity probe against `/health`.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Validated remote API endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Build a config from a base URL.
    ///
    /// The URL must include an `http://` or `https://` scheme; trailing
    /// slashes are trimmed so route paths can be appended verbatim.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_text_option(Some(base_url.into())).ok_or_else(|| {
            Error::InvalidConfiguration("API base URL must not be empty".to_string())
        })?;
        if !is_http_url(&base_url) {
            return Err(Error::InvalidConfiguration(
                "API base URL must include http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_and_schemeless_urls() {
        assert!(ApiConfig::new("").is_err());
        assert!(ApiConfig::new("   ").is_err());
        assert!(ApiConfig::new("api.example.com").is_err());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let config = ApiConfig::new("https://api.example.com/").unwrap();
        assert_eq!(config.base_url(), "https://api.example.com");
    }
}
