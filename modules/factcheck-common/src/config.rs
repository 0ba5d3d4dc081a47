use std::env;

use tracing::warn;

/// Calls reserved for the single prescreen round trip.
pub const PRESCREEN_RESERVED_CALLS: u32 = 1;
/// One combined extract+query call plus one classification call.
pub const CALLS_PER_INVESTIGATION: u32 = 2;
/// Floor target for total calls in a scan.
pub const MIN_CALLS_TARGET: u32 = 8;
/// Blocks beyond this count are dropped from a scan request.
pub const MAX_BLOCKS_PER_SCAN: usize = 20;

const DEFAULT_BUDGET: u32 = 10;
const DEFAULT_CONCURRENCY: usize = 4;

/// Call budget for one scan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBudget {
    pub total_calls: u32,
    pub cost_per_investigation: u32,
    pub min_calls_target: u32,
    pub reserved_calls_for_prescreen: u32,
}

impl ScanBudget {
    pub fn new(total_calls: u32) -> Self {
        Self {
            total_calls,
            cost_per_investigation: CALLS_PER_INVESTIGATION,
            min_calls_target: MIN_CALLS_TARGET,
            reserved_calls_for_prescreen: PRESCREEN_RESERVED_CALLS,
        }
    }
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

/// Application configuration, read once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    // Budget
    pub budget: ScanBudget,
    pub investigation_concurrency: usize,

    // AI provider
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // Search providers
    pub brave_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables. Every setting has a
    /// default, so a bare environment yields a runnable (mock-backed) server.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Negative budgets clamp to zero rather than falling back to the default.
        let total_calls = parsed_or(&lookup, "GEMINI_BUDGET", i64::from(DEFAULT_BUDGET))
            .clamp(0, i64::from(u32::MAX)) as u32;
        Self {
            budget: ScanBudget::new(total_calls),
            investigation_concurrency: parsed_or(&lookup, "SCAN_CONCURRENCY", DEFAULT_CONCURRENCY)
                .max(1),
            gemini_api_key: non_empty(&lookup, "GEMINI_API_KEY"),
            gemini_model: non_empty(&lookup, "GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            brave_api_key: non_empty(&lookup, "BRAVE_API_KEY"),
            serpapi_api_key: non_empty(&lookup, "SERPAPI_API_KEY"),
            web_host: non_empty(&lookup, "API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parsed_or(&lookup, "API_PORT", 8000),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match non_empty(lookup, key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = raw.as_str(), %default, "Unparseable setting, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.budget, ScanBudget::new(10));
        assert_eq!(config.budget.cost_per_investigation, 2);
        assert_eq!(config.budget.min_calls_target, 8);
        assert_eq!(config.investigation_concurrency, 4);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.web_port, 8000);
    }

    #[test]
    fn budget_comes_from_gemini_budget() {
        let config = config_from(&[("GEMINI_BUDGET", "4")]);
        assert_eq!(config.budget.total_calls, 4);
    }

    #[test]
    fn unparseable_budget_falls_back_to_default() {
        let config = config_from(&[("GEMINI_BUDGET", "lots")]);
        assert_eq!(config.budget.total_calls, 10);
    }

    #[test]
    fn negative_budget_clamps_to_zero() {
        let config = config_from(&[("GEMINI_BUDGET", "-3")]);
        assert_eq!(config.budget.total_calls, 0);
    }

    #[test]
    fn blank_keys_are_treated_as_missing() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("BRAVE_API_KEY", "brv")]);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.brave_api_key.as_deref(), Some("brv"));
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let config = config_from(&[("SCAN_CONCURRENCY", "0")]);
        assert_eq!(config.investigation_concurrency, 1);
    }
}
