//! Engine configuration.

use crate::error::CommerceError;
use crate::money::Currency;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for the checkout engine, loaded from TOML.
///
/// ```toml
/// currency = "EUR"
/// fetch_timeout_ms = 2000
/// coupon_lookup_timeout_ms = 1500
/// default_country = "Germany"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency new carts are created in.
    pub currency: Currency,
    /// Bound on one catalog snapshot request.
    pub fetch_timeout_ms: u64,
    /// Bound on one coupon lookup.
    pub coupon_lookup_timeout_ms: u64,
    /// Country used for taxes when the customer has not chosen one.
    pub default_country: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            fetch_timeout_ms: 2000,
            coupon_lookup_timeout_ms: 1500,
            default_country: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, CommerceError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| CommerceError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&input)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn coupon_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.coupon_lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.fetch_timeout(), Duration::from_secs(2));
        assert_eq!(config.coupon_lookup_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            currency = "EGP"
            default_country = "Egypt"
            "#,
        )
        .unwrap();
        assert_eq!(config.currency, Currency::EGP);
        assert_eq!(config.default_country.as_deref(), Some("Egypt"));
        assert_eq!(config.fetch_timeout_ms, 2000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("fetch_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, CommerceError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/storefront.toml").unwrap_err();
        assert!(matches!(err, CommerceError::Config(_)));
    }
}
