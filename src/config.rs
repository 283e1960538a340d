//! Guard configuration.
//!
//! Values come from the environment, falling back to defaults when a variable
//! is unset or does not parse. Both structs also deserialize with `serde` so a
//! host application can embed them in its own configuration file.

use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Browser-like agent string; the public lookup service rejects bare clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36";

/// Header names the guards read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Header carrying the caller's rights token
    pub rights_header: String,
    /// Header carrying the forwarded-for address chain
    pub forwarded_for_header: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            rights_header: "Rights".into(),
            forwarded_for_header: "X-Forwarded-For".into(),
        }
    }
}

impl HeaderConfig {
    /// Reads `GUARD_RIGHTS_HEADER` and `GUARD_FORWARDED_FOR_HEADER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rights_header: env::var("GUARD_RIGHTS_HEADER").unwrap_or(defaults.rights_header),
            forwarded_for_header: env::var("GUARD_FORWARDED_FOR_HEADER")
                .unwrap_or(defaults.forwarded_for_header),
        }
    }
}

/// Settings for the address-to-location lookup client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Service root; the client requests `{base_url}/{ip}/json/`
    pub base_url: String,
    /// Value sent in the `user-agent` header
    pub user_agent: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ipapi.co".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 10,
        }
    }
}

impl LookupConfig {
    /// Reads `GEO_LOOKUP_BASE_URL`, `GEO_LOOKUP_USER_AGENT` and
    /// `GEO_LOOKUP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("GEO_LOOKUP_BASE_URL").unwrap_or(defaults.base_url),
            user_agent: env::var("GEO_LOOKUP_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_secs: env::var("GEO_LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Lookup URL for `ip`.
    pub fn url_for(&self, ip: &str) -> String {
        format!("{}/{}/json/", self.base_url.trim_end_matches('/'), ip)
    }
}
