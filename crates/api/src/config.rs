//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use stockflow_maintenance::MaintenancePolicy;
use stockflow_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub maintenance_policy: MaintenancePolicy,
    /// Currency for purchase orders that do not name one.
    pub currency: String,
    /// Number of recent domain events kept for `/activity`.
    pub activity_capacity: usize,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            maintenance_policy: MaintenancePolicy::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            log_format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    /// Read `STOCKFLOW_*` and `LOG_FORMAT`; unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = value("STOCKFLOW_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("STOCKFLOW_BIND_ADDR", e))?;

        let maintenance_policy = match value("STOCKFLOW_DUE_SOON_DAYS") {
            None => MaintenancePolicy::default(),
            Some(raw) => {
                let days = raw
                    .parse::<i64>()
                    .map_err(|e| ConfigError::invalid("STOCKFLOW_DUE_SOON_DAYS", e))?;
                MaintenancePolicy::new(days)
                    .map_err(|e| ConfigError::invalid("STOCKFLOW_DUE_SOON_DAYS", e))?
            }
        };

        let currency = value("STOCKFLOW_CURRENCY")
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let activity_capacity = match value("STOCKFLOW_ACTIVITY_CAPACITY") {
            None => DEFAULT_ACTIVITY_CAPACITY,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::invalid(
                        "STOCKFLOW_ACTIVITY_CAPACITY",
                        "must be at least 1",
                    ));
                }
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("STOCKFLOW_ACTIVITY_CAPACITY", e)),
            },
        };

        let log_format = match value("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?,
        };

        Ok(Self {
            bind_addr,
            maintenance_policy,
            currency,
            activity_capacity,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.maintenance_policy.due_soon_days(), 7);
    }

    #[test]
    fn reads_every_variable() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("STOCKFLOW_BIND_ADDR", "127.0.0.1:9000"),
            ("STOCKFLOW_DUE_SOON_DAYS", "14"),
            ("STOCKFLOW_CURRENCY", "eur"),
            ("STOCKFLOW_ACTIVITY_CAPACITY", "10"),
            ("LOG_FORMAT", "text"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.maintenance_policy.due_soon_days(), 14);
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.activity_capacity, 10);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn rejects_negative_window() {
        let err = ApiConfig::from_lookup(lookup(&[("STOCKFLOW_DUE_SOON_DAYS", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STOCKFLOW_DUE_SOON_DAYS", .. }));
    }

    #[test]
    fn rejects_malformed_values() {
        for (key, raw) in [
            ("STOCKFLOW_BIND_ADDR", "localhost"),
            ("STOCKFLOW_DUE_SOON_DAYS", "soon"),
            ("STOCKFLOW_ACTIVITY_CAPACITY", "0"),
            ("LOG_FORMAT", "xml"),
        ] {
            let err = ApiConfig::from_lookup(lookup(&[(key, raw)])).unwrap_err();
            let ConfigError::Invalid { key: got, .. } = err;
            assert_eq!(got, key);
        }
    }
}
