//! Provider configuration
//!
//! Credentials, endpoints and scope are resolved once when the provider is
//! constructed; handlers never read the environment themselves.

use std::env;
use std::time::Duration;

use cirrus_sdk::PollConfig;
use vela_core::provider::{ProviderError, ProviderResult};

pub const DEFAULT_API_URL: &str = "https://api.cirrus.dev";

const ENV_API_TOKEN: &str = "CIRRUS_API_TOKEN";
const ENV_API_URL: &str = "CIRRUS_API_URL";
const ENV_CDN_API_URL: &str = "CIRRUS_CDN_API_URL";
const ENV_DNS_API_URL: &str = "CIRRUS_DNS_API_URL";
const ENV_STORAGE_API_URL: &str = "CIRRUS_STORAGE_API_URL";
const ENV_EDGE_API_URL: &str = "CIRRUS_EDGE_API_URL";
const ENV_WAAP_API_URL: &str = "CIRRUS_WAAP_API_URL";
const ENV_PROJECT_ID: &str = "CIRRUS_PROJECT_ID";
const ENV_PROJECT_NAME: &str = "CIRRUS_PROJECT_NAME";
const ENV_REGION_ID: &str = "CIRRUS_REGION_ID";
const ENV_TASK_TIMEOUT: &str = "CIRRUS_TASK_TIMEOUT_SECS";

/// Resolved provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Permanent API token
    pub api_token: String,
    /// Platform base URL
    pub api_url: String,
    /// Per-product endpoint overrides (global products)
    pub cdn_api_url: Option<String>,
    pub dns_api_url: Option<String>,
    pub storage_api_url: Option<String>,
    pub edge_api_url: Option<String>,
    pub waap_api_url: Option<String>,
    /// Project scope: exactly one of id or name
    pub project_id: Option<u64>,
    pub project_name: Option<String>,
    pub region_id: u64,
    /// Budget for one task wait; handlers share it
    pub task_timeout: Duration,
}

impl ProviderConfig {
    /// Minimal configuration for a known project id (hosts and tests)
    pub fn new(api_token: impl Into<String>, project_id: u64, region_id: u64) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            cdn_api_url: None,
            dns_api_url: None,
            storage_api_url: None,
            edge_api_url: None,
            waap_api_url: None,
            project_id: Some(project_id),
            project_name: None,
            region_id,
            task_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Read the configuration from the environment, once
    pub fn from_env() -> ProviderResult<Self> {
        let api_token = env::var(ENV_API_TOKEN)
            .map_err(|_| ProviderError::new(format!("{} is not set", ENV_API_TOKEN)))?;

        let project_id = match env::var(ENV_PROJECT_ID) {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ProviderError::new(format!("{} must be an integer, got '{}'", ENV_PROJECT_ID, raw))
            })?),
            Err(_) => None,
        };
        let project_name = env::var(ENV_PROJECT_NAME).ok();

        let region_id = env::var(ENV_REGION_ID)
            .map_err(|_| ProviderError::new(format!("{} is not set", ENV_REGION_ID)))?
            .parse::<u64>()
            .map_err(|_| ProviderError::new(format!("{} must be an integer", ENV_REGION_ID)))?;

        let task_timeout = match env::var(ENV_TASK_TIMEOUT) {
            Ok(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                ProviderError::new(format!("{} must be an integer", ENV_TASK_TIMEOUT))
            })?),
            Err(_) => Duration::from_secs(600),
        };

        let config = Self {
            api_token,
            api_url: env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            cdn_api_url: env::var(ENV_CDN_API_URL).ok(),
            dns_api_url: env::var(ENV_DNS_API_URL).ok(),
            storage_api_url: env::var(ENV_STORAGE_API_URL).ok(),
            edge_api_url: env::var(ENV_EDGE_API_URL).ok(),
            waap_api_url: env::var(ENV_WAAP_API_URL).ok(),
            project_id,
            project_name,
            region_id,
            task_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Project id and name are mutually exclusive; one must be present
    pub fn validate(&self) -> ProviderResult<()> {
        match (&self.project_id, &self.project_name) {
            (Some(_), Some(_)) => Err(ProviderError::new(format!(
                "{} and {} are mutually exclusive",
                ENV_PROJECT_ID, ENV_PROJECT_NAME
            ))),
            (None, None) => Err(ProviderError::new(format!(
                "one of {} or {} must be set",
                ENV_PROJECT_ID, ENV_PROJECT_NAME
            ))),
            _ => Ok(()),
        }
    }

    /// Poll cadence used for every task wait
    pub fn poll(&self) -> PollConfig {
        PollConfig::with_timeout(self.task_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_and_name_are_mutually_exclusive() {
        let mut config = ProviderConfig::new("token", 1, 7);
        config.project_name = Some("default".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_project_scope_is_rejected() {
        let mut config = ProviderConfig::new("token", 1, 7);
        config.project_id = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn id_only_is_accepted() {
        assert!(ProviderConfig::new("token", 1, 7).validate().is_ok());
    }
}
