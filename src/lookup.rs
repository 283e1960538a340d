//! Address-to-location lookup used by the enrichment guard.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LookupConfig;
use crate::error::LookupError;

/// Geolocation record for one address, taken verbatim from the service.
///
/// Every field is optional: the service omits fields it cannot determine
/// (private ranges, reserved blocks).
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationInfo {
    pub ip: Option<String>,
    pub network: Option<String>,
    pub version: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub country_code_iso3: Option<String>,
    pub country_capital: Option<String>,
    pub country_tld: Option<String>,
    pub continent_code: Option<String>,
    pub in_eu: Option<bool>,
    pub postal: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub utc_offset: Option<String>,
    pub country_calling_code: Option<String>,
    pub currency: Option<String>,
    pub currency_name: Option<String>,
    pub languages: Option<String>,
    pub country_area: Option<f64>,
    pub country_population: Option<f64>,
    pub asn: Option<String>,
    pub org: Option<String>,
    pub hostname: Option<String>,
}

impl LocationInfo {
    /// Decodes a service reply, rejecting `{"error": true, "reason": ...}` records.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Rejected`] for error records and
    /// [`LookupError::InvalidRecord`] for records that do not decode.
    pub fn from_record(record: Value) -> Result<Self, LookupError> {
        if record.get("error").and_then(Value::as_bool) == Some(true) {
            let reason = record
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unspecified")
                .to_string();
            return Err(LookupError::Rejected { reason });
        }
        Ok(serde_json::from_value(record)?)
    }
}

/// Resolves a client address to a location.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Looks up `ip`.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding failure. Callers treat it as an
    /// operational failure of the whole request.
    async fn locate(&self, ip: &str) -> Result<LocationInfo, LookupError>;
}

/// [`LocationLookup`] backed by an ipapi-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct IpApiClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl IpApiClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Client configured from the environment.
    ///
    /// # Errors
    ///
    /// See [`IpApiClient::new`].
    pub fn from_env() -> Result<Self, LookupError> {
        Self::new(LookupConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }
}

#[async_trait]
impl LocationLookup for IpApiClient {
    async fn locate(&self, ip: &str) -> Result<LocationInfo, LookupError> {
        let record: Value = self
            .http
            .get(self.config.url_for(ip))
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(ip = %ip, "location record received");
        LocationInfo::from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_decodes_known_fields_and_ignores_extras() {
        let info = LocationInfo::from_record(json!({
            "ip": "203.0.113.9",
            "city": "Amsterdam",
            "in_eu": true,
            "latitude": 52.37,
            "country_population": 17_231_017,
            "unlisted_field": "ignored"
        }))
        .unwrap();

        assert_eq!(info.city.as_deref(), Some("Amsterdam"));
        assert_eq!(info.in_eu, Some(true));
        assert_eq!(info.country_population, Some(17_231_017.0));
        assert!(info.asn.is_none());
    }

    #[test]
    fn error_record_is_rejected() {
        let err = LocationInfo::from_record(json!({
            "ip": "127.0.0.1",
            "error": true,
            "reason": "Reserved IP Address"
        }))
        .unwrap_err();

        assert!(matches!(err, LookupError::Rejected { ref reason } if reason == "Reserved IP Address"));
    }

    #[test]
    fn mistyped_record_is_invalid() {
        let err = LocationInfo::from_record(json!({ "latitude": "north" })).unwrap_err();
        assert!(matches!(err, LookupError::InvalidRecord(_)));
    }

    #[test]
    fn client_keeps_its_config() {
        let config = LookupConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..LookupConfig::default()
        };
        let client = IpApiClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }
}
