//! Client configuration.

use std::time::Duration;

use crate::device::TimeoutPolicy;
use crate::origin::{BaseLocation, ResolveError};

/// Default application base location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    BaseLocation(#[from] ResolveError),

    #[error("{name} must be a positive number of milliseconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: TimeoutPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: TimeoutPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build from `ARCADE_BASE_URL`, `ARCADE_TIMEOUT_STANDARD_MS` and
    /// `ARCADE_TIMEOUT_CONSTRAINED_MS`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = TimeoutPolicy::default();
        let config = Self {
            base_url: lookup("ARCADE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeouts: TimeoutPolicy {
                standard: timeout_var(&lookup, "ARCADE_TIMEOUT_STANDARD_MS", defaults.standard)?,
                constrained: timeout_var(
                    &lookup,
                    "ARCADE_TIMEOUT_CONSTRAINED_MS",
                    defaults.constrained,
                )?,
            },
        };
        config.base_location()?;
        Ok(config)
    }

    pub fn base_location(&self) -> Result<BaseLocation, ConfigError> {
        Ok(BaseLocation::parse(&self.base_url)?)
    }
}

fn timeout_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn overrides_from_vars() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ARCADE_BASE_URL", "https://arcade.example"),
            ("ARCADE_TIMEOUT_STANDARD_MS", "2500"),
            ("ARCADE_TIMEOUT_CONSTRAINED_MS", "7000"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://arcade.example");
        assert_eq!(config.timeouts.standard, Duration::from_millis(2500));
        assert_eq!(config.timeouts.constrained, Duration::from_millis(7000));
    }

    #[test]
    fn rejects_zero_or_garbage_timeouts() {
        for value in ["0", "soon", "-5"] {
            let err =
                ClientConfig::from_lookup(lookup(&[("ARCADE_TIMEOUT_STANDARD_MS", value)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout { .. }), "{value}");
        }
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[("ARCADE_BASE_URL", "ftp://arcade")])).unwrap_err();
        assert!(matches!(err, ConfigError::BaseLocation(_)));
    }
}
