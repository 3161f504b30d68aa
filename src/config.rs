//! Dispatch configuration

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Configuration for the dispatch runner
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Drone ids to seed the registry with
    pub fleet: Vec<String>,
    /// Number of simulated delivery requests
    pub requests: usize,
    /// How long a delivery holds its drone
    pub delivery_time: Duration,
    /// Wait before retrying when the whole fleet is busy
    pub retry_delay: Duration,
    /// Attempts per request before it is reported as failed
    pub max_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fleet: (1..=8).map(|n| format!("drone-{:03}", n)).collect(),
            requests: 32,
            delivery_time: Duration::from_millis(50),
            retry_delay: Duration::from_millis(20),
            max_attempts: 20,
        }
    }
}

impl DispatchConfig {
    /// Defaults overlaid with `SKYHAUL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each key
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(fleet) = lookup("SKYHAUL_FLEET") {
            config.fleet = fleet
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
            if config.fleet.is_empty() {
                return Err(anyhow!("SKYHAUL_FLEET names no drones"));
            }
        }
        if let Some(requests) = lookup("SKYHAUL_REQUESTS") {
            config.requests = parse("SKYHAUL_REQUESTS", &requests)?;
        }
        if let Some(ms) = lookup("SKYHAUL_DELIVERY_MS") {
            config.delivery_time = Duration::from_millis(parse("SKYHAUL_DELIVERY_MS", &ms)?);
        }
        if let Some(ms) = lookup("SKYHAUL_RETRY_MS") {
            config.retry_delay = Duration::from_millis(parse("SKYHAUL_RETRY_MS", &ms)?);
        }
        if let Some(attempts) = lookup("SKYHAUL_MAX_ATTEMPTS") {
            config.max_attempts = parse("SKYHAUL_MAX_ATTEMPTS", &attempts)?;
        }

        Ok(config)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.fleet.len(), 8);
        assert_eq!(config.fleet[0], "drone-001");
        assert_eq!(config.requests, 32);
        assert_eq!(config.max_attempts, 20);
    }

    #[test]
    fn test_overrides() {
        let config = DispatchConfig::from_lookup(lookup(&[
            ("SKYHAUL_FLEET", "a, b,,c"),
            ("SKYHAUL_REQUESTS", "5"),
            ("SKYHAUL_DELIVERY_MS", "10"),
            ("SKYHAUL_RETRY_MS", "3"),
            ("SKYHAUL_MAX_ATTEMPTS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.fleet, vec!["a", "b", "c"]);
        assert_eq!(config.requests, 5);
        assert_eq!(config.delivery_time, Duration::from_millis(10));
        assert_eq!(config.retry_delay, Duration::from_millis(3));
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn test_malformed_values_rejected() {
        let err = DispatchConfig::from_lookup(lookup(&[("SKYHAUL_REQUESTS", "many")])).unwrap_err();
        assert!(err.to_string().contains("SKYHAUL_REQUESTS"));

        assert!(DispatchConfig::from_lookup(lookup(&[("SKYHAUL_FLEET", " , ")])).is_err());
    }
}
