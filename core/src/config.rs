//! Runtime settings for talking to the registry.
//!
//! Defaults point at the public PRH open-data endpoint. Each value can be
//! overridden from the environment:
//!
//! | variable                  | meaning                          | default |
//! |---------------------------|----------------------------------|---------|
//! | `REGISTRY_BASE_URL`       | registry API root                | PRH v3  |
//! | `REGISTRY_CACHE_TTL_SECS` | how long a result page is fresh  | 60      |
//! | `REGISTRY_TIMEOUT_SECS`   | per-request timeout              | 30      |

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://avoindata.prh.fi/opendata-ytj-api/v3";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const BASE_URL_VAR: &str = "REGISTRY_BASE_URL";
const CACHE_TTL_VAR: &str = "REGISTRY_CACHE_TTL_SECS";
const TIMEOUT_VAR: &str = "REGISTRY_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source. Unset variables
    /// keep their defaults; set but invalid ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(BASE_URL_VAR) {
            let parsed = url::Url::parse(&value).ok();
            if !parsed.is_some_and(|u| matches!(u.scheme(), "http" | "https")) {
                return Err(ConfigError::InvalidBaseUrl {
                    var: BASE_URL_VAR,
                    value,
                });
            }
            config.base_url = value;
        }
        if let Some(value) = lookup(CACHE_TTL_VAR) {
            config.cache_ttl = seconds(CACHE_TTL_VAR, value)?;
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            config.request_timeout = seconds(TIMEOUT_VAR, value)?;
        }

        Ok(config)
    }
}

fn seconds(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::InvalidSeconds { var, value }),
    }
}
