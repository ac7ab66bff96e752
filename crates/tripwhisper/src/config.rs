//! Startup configuration read from the environment.

use std::env;
use std::error::Error;
use std::fmt::{self, Display};
use std::time::Duration;

use tripwhisper_core::{
    DEFAULT_WINDOW_SIZE, ExponentialBackoff, MAX_WINDOW_SIZE, MIN_WINDOW_SIZE,
    PreferenceSet,
};
use tripwhisper_core::preferences::DEFAULT_MODEL_ID;

/// Holds the API credential.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Overrides the provider endpoint.
pub const BASE_URL_VAR: &str = "GROQ_BASE_URL";
/// Selects the initial model.
pub const MODEL_VAR: &str = "TRIPWHISPER_MODEL";
/// Selects the initial conversation memory length.
pub const MEMORY_VAR: &str = "TRIPWHISPER_MEMORY";
/// Limits how long one provider call may take, in seconds.
pub const TIMEOUT_VAR: &str = "TRIPWHISPER_TIMEOUT_SECS";
/// Enables retrying transient provider failures.
pub const RETRY_VAR: &str = "TRIPWHISPER_RETRY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything the host needs before the first turn.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// The API credential.
    pub api_key: String,
    /// A custom endpoint, if any.
    pub base_url: Option<String>,
    /// The model of the first session.
    pub model: String,
    /// The memory length of the first session.
    pub window_size: usize,
    /// Per-call timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Whether transient failures are retried.
    pub retry: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value
    /// of a variable if it is set.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::MissingCredential)?;

        let window_size = match lookup(MEMORY_VAR) {
            None => DEFAULT_WINDOW_SIZE,
            Some(value) => value
                .parse()
                .ok()
                .filter(|size| {
                    (MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(size)
                })
                .ok_or_else(|| ConfigError::invalid(MEMORY_VAR, value))?,
        };

        let timeout = match lookup(TIMEOUT_VAR) {
            None => Some(DEFAULT_TIMEOUT),
            Some(value) => match value.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => return Err(ConfigError::invalid(TIMEOUT_VAR, value)),
            },
        };

        let retry = match lookup(RETRY_VAR).as_deref() {
            None | Some("0" | "false" | "no" | "off") => false,
            Some("1" | "true" | "yes" | "on") => true,
            Some(value) => {
                return Err(ConfigError::invalid(RETRY_VAR, value));
            }
        };

        Ok(Self {
            api_key,
            base_url: lookup(BASE_URL_VAR),
            model: lookup(MODEL_VAR)
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_owned()),
            window_size,
            timeout,
            retry,
        })
    }

    /// Returns the preferences of the first session.
    pub fn initial_preferences(&self) -> PreferenceSet {
        PreferenceSet {
            model_id: self.model.clone(),
            ..Default::default()
        }
    }

    /// Returns the retry policy, if retrying is enabled.
    pub fn backoff(&self) -> Option<ExponentialBackoff> {
        self.retry.then(|| ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("window_size", &self.window_size)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// A configuration problem that prevents startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The API credential is missing or empty.
    MissingCredential,
    /// A variable has a value we cannot use.
    InvalidValue {
        /// Name of the variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            name,
            value: value.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredential => write!(
                f,
                "{API_KEY_VAR} not found, please set it in the environment"
            ),
            ConfigError::InvalidValue { name, value } => {
                write!(f, "invalid value for {name}: {value:?}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_missing_credential() {
        assert_eq!(config_from(&[]), Err(ConfigError::MissingCredential));
        assert_eq!(
            config_from(&[(API_KEY_VAR, "   ")]),
            Err(ConfigError::MissingCredential)
        );
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[(API_KEY_VAR, "gsk_secret")]).unwrap();
        assert_eq!(config.api_key, "gsk_secret");
        assert_eq!(config.base_url, None);
        assert_eq!(config.model, DEFAULT_MODEL_ID);
        assert_eq!(config.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert!(config.backoff().is_none());
        assert!(!format!("{config:?}").contains("gsk_secret"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (API_KEY_VAR, "gsk_secret"),
            (MODEL_VAR, "Mixtral-8x7b-32768"),
            (MEMORY_VAR, "10"),
            (TIMEOUT_VAR, "0"),
            (RETRY_VAR, "yes"),
        ])
        .unwrap();
        assert_eq!(config.initial_preferences().model_id, "Mixtral-8x7b-32768");
        assert_eq!(config.window_size, 10);
        assert_eq!(config.timeout, None);
        assert!(config.backoff().is_some());
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config_from(&[(API_KEY_VAR, "k"), (MEMORY_VAR, "11")]),
            Err(ConfigError::invalid(MEMORY_VAR, "11"))
        );
        assert!(config_from(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "soon")]).is_err());
        assert!(config_from(&[(API_KEY_VAR, "k"), (RETRY_VAR, "maybe")]).is_err());
    }
}
