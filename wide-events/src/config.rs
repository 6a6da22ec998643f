use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use wide_events_log::LogConfig;
use wide_events_protocol::ServiceContext;
use wide_events_sampling::{SamplingConfig, SamplingConfigError};

/// An error returned when loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config file")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("could not parse config file")]
    Parse(#[from] serde_json::Error),

    /// The sampling policy is invalid.
    #[error("invalid sampling policy")]
    Sampling(#[from] SamplingConfigError),
}

/// The complete configuration surface.
///
/// Combines the service identity attached to every record, the tail sampling
/// policy and the logging setup. Constructed once before traffic begins;
/// runtime reconfiguration swaps a whole new value through
/// [`RequestLifecycle::reconfigure`](crate::RequestLifecycle::reconfigure).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of the service emitting events.
    pub service: ServiceContext,
    /// The tail sampling policy.
    pub sampling: SamplingConfig,
    /// Logging configuration.
    pub log: LogConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Overrides the service identity from well-known environment variables.
    ///
    /// Reads `SERVICE_NAME`, `SERVICE_VERSION`, `DEPLOYMENT_ID` and `REGION`;
    /// unset variables leave the configured values untouched.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.service_name = name;
        }
        if let Ok(version) = env::var("SERVICE_VERSION") {
            self.service.service_version = version;
        }
        if let Ok(deployment_id) = env::var("DEPLOYMENT_ID") {
            self.service.deployment_id = Some(deployment_id);
        }
        if let Ok(region) = env::var("REGION") {
            self.service.region = Some(region);
        }
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling.validate()?;
        Ok(())
    }
}
