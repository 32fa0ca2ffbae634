use std::env;
use std::time::Duration;

use dashboard::DashboardConfig;
use streaming::cache::CachePolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// A configuration variable is set but unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}={:?}: {}", self.key, self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend root; endpoints live under `<api_url>/api`.
    pub api_url: String,
    pub timeout: Duration,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from `lookup`, which maps a variable name to its
    /// value. Unset variables take their defaults; set but malformed ones are
    /// errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("ARGO_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError {
                key: "ARGO_API_URL",
                value: api_url,
                reason: "expected an http:// or https:// URL",
            });
        }

        let timeout = env_var_secs(&lookup, "ARGO_HTTP_TIMEOUT_SECS", 30)?;
        let table_limit = env_var_usize(
            &lookup,
            "ARGO_TABLE_LIMIT",
            layers::table::DEFAULT_TABLE_LIMIT,
        )?;
        let profiles = CachePolicy::new(
            env_var_secs(
                &lookup,
                "ARGO_PROFILES_STALE_SECS",
                CachePolicy::PROFILES.stale_after.as_secs(),
            )?,
            env_var_secs(
                &lookup,
                "ARGO_PROFILES_RETAIN_SECS",
                CachePolicy::PROFILES.retain_for.as_secs(),
            )?,
        );
        let measurements = CachePolicy::new(
            env_var_secs(
                &lookup,
                "ARGO_MEASUREMENTS_STALE_SECS",
                CachePolicy::MEASUREMENTS.stale_after.as_secs(),
            )?,
            CachePolicy::MEASUREMENTS.retain_for,
        );

        Ok(Self {
            api_url,
            timeout,
            dashboard: DashboardConfig {
                table_limit,
                profiles,
                measurements,
                ..DashboardConfig::default()
            },
        })
    }
}

fn env_var_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value: u64 = raw.trim().parse().map_err(|_| ConfigError {
        key,
        value: raw.clone(),
        reason: "expected a non-negative integer",
    })?;
    if value == 0 {
        return Err(ConfigError {
            key,
            value: raw,
            reason: "must be positive",
        });
    }
    Ok(value)
}

fn env_var_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    env_var_u64(lookup, key, default).map(Duration::from_secs)
}

fn env_var_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let value = env_var_u64(lookup, key, default as u64)?;
    usize::try_from(value).map_err(|_| ConfigError {
        key,
        value: value.to_string(),
        reason: "too large",
    })
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_API_URL};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, super::ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]).unwrap();
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(c.timeout, Duration::from_secs(30));
        assert_eq!(c.dashboard.table_limit, 200);
        assert_eq!(c.dashboard.profiles.stale_after, Duration::from_secs(300));
        assert_eq!(c.dashboard.profiles.retain_for, Duration::from_secs(600));
        assert_eq!(c.dashboard.measurements.stale_after, Duration::from_secs(60));
    }

    #[test]
    fn overrides_apply() {
        let c = config(&[
            ("ARGO_API_URL", "https://argo.example.org"),
            ("ARGO_TABLE_LIMIT", "25"),
            ("ARGO_PROFILES_STALE_SECS", " 120 "),
        ])
        .unwrap();
        assert_eq!(c.api_url, "https://argo.example.org");
        assert_eq!(c.dashboard.table_limit, 25);
        assert_eq!(c.dashboard.profiles.stale_after, Duration::from_secs(120));
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = config(&[("ARGO_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(err.key, "ARGO_HTTP_TIMEOUT_SECS");
        assert_eq!(
            err.to_string(),
            "invalid ARGO_HTTP_TIMEOUT_SECS=\"soon\": expected a non-negative integer"
        );

        assert!(config(&[("ARGO_TABLE_LIMIT", "0")]).is_err());
        assert!(config(&[("ARGO_API_URL", "ftp://argo")]).is_err());
    }
}
