//! Per-`ServiceKind` gateway routing configuration, parsed from environment
//! variables (spec.md §3 `ServiceDescriptor`).
//!
//! Each service reads `<PREFIX>_INSTANCES` (comma-separated URLs),
//! `<PREFIX>_TIMEOUT_MS`, `<PREFIX>_FAIL_MAX`, `<PREFIX>_RESET_TIMEOUT_MS`,
//! `<PREFIX>_RETRY_BUDGET` and `<PREFIX>_ENABLED`, where `<PREFIX>` is the
//! service's uppercase path prefix (e.g. `CHART_SERVICE_INSTANCES`).

use std::env;
use std::time::Duration;

use crate::domain::service_kind::ServiceKind;

/// Environment-sourced settings for one `ServiceDescriptor` (spec.md §3).
/// `retry_budget` is advisory only: the gateway itself fails fast and never
/// retries (spec.md §4.1.5); this value is surfaced to clients that choose
/// to retry on their own.
#[derive(Debug, Clone)]
pub struct ServiceEnvConfig {
    pub kind: ServiceKind,
    pub instances: Vec<String>,
    pub enabled: bool,
    pub timeout_ms: u32,
    pub retry_budget: u8,
    pub fail_max: usize,
    pub reset_timeout: Duration,
}

impl ServiceEnvConfig {
    fn env_key(prefix: &str, suffix: &str) -> String {
        format!("{prefix}_SERVICE_{suffix}")
    }

    pub fn from_env(kind: ServiceKind) -> Self {
        let prefix = kind.path_prefix().to_ascii_uppercase();

        let instances = env::var(Self::env_key(&prefix, "INSTANCES"))
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let enabled = env::var(Self::env_key(&prefix, "ENABLED"))
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(!instances.is_empty());

        let timeout_ms = env::var(Self::env_key(&prefix, "TIMEOUT_MS"))
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5_000);

        let retry_budget = env::var(Self::env_key(&prefix, "RETRY_BUDGET"))
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(0);

        let fail_max = env::var(Self::env_key(&prefix, "FAIL_MAX"))
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(3);

        let reset_timeout_ms = env::var(Self::env_key(&prefix, "RESET_TIMEOUT_MS"))
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30_000);

        Self {
            kind,
            instances,
            enabled,
            timeout_ms,
            retry_budget,
            fail_max,
            reset_timeout: Duration::from_millis(reset_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_with_no_instances_are_disabled() {
        // SAFETY: test-only, single-threaded env mutation scoped to this key.
        unsafe {
            env::remove_var("NEWS_SERVICE_INSTANCES");
            env::remove_var("NEWS_SERVICE_ENABLED");
        }
        let cfg = ServiceEnvConfig::from_env(ServiceKind::News);
        assert!(!cfg.enabled);
        assert!(cfg.instances.is_empty());
    }

    #[test]
    fn instances_parse_as_comma_separated_list() {
        unsafe {
            env::set_var(
                "CHART_SERVICE_INSTANCES",
                "http://a:8080, http://b:8080 ,http://c:8080",
            );
        }
        let cfg = ServiceEnvConfig::from_env(ServiceKind::Chart);
        assert_eq!(cfg.instances.len(), 3);
        assert_eq!(cfg.instances[1], "http://b:8080");
        unsafe {
            env::remove_var("CHART_SERVICE_INSTANCES");
        }
    }
}
