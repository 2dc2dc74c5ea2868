use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BENCHMARK_TICKER, DEFAULT_CALENDAR_START_YEAR, DEFAULT_COMPUTE_BUDGET_SECS,
    DEFAULT_INITIAL_BALANCE, DEFAULT_LOOKBACK_CAP_DAYS, DEFAULT_PRICE_CACHE_TTL_SECS,
    DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_RISK_FREE_RATE, MAX_LOOKBACK_CAP_DAYS,
};

pub const ENV_LOOKBACK_CAP_DAYS: &str = "ALPHABOARD_LOOKBACK_CAP_DAYS";
pub const ENV_COMPUTE_BUDGET_SECS: &str = "ALPHABOARD_COMPUTE_BUDGET_SECS";
pub const ENV_PROVIDER_TIMEOUT_SECS: &str = "ALPHABOARD_PROVIDER_TIMEOUT_SECS";
pub const ENV_RISK_FREE_RATE: &str = "ALPHABOARD_RISK_FREE_RATE";
pub const ENV_BENCHMARK_TICKER: &str = "ALPHABOARD_BENCHMARK_TICKER";
pub const ENV_INITIAL_BALANCE: &str = "ALPHABOARD_INITIAL_BALANCE";
pub const ENV_PRICE_CACHE_TTL_SECS: &str = "ALPHABOARD_PRICE_CACHE_TTL_SECS";
pub const ENV_CALENDAR_START_YEAR: &str = "ALPHABOARD_CALENDAR_START_YEAR";

/// Tunables for the performance and rebalancing services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceSettings {
    pub lookback_cap_days: i64,
    pub compute_budget_secs: u64,
    pub provider_timeout_secs: u64,
    pub risk_free_rate: Decimal,
    pub benchmark_ticker: String,
    pub initial_balance: Decimal,
    pub price_cache_ttl_secs: u64,
    pub calendar_start_year: i32,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            lookback_cap_days: DEFAULT_LOOKBACK_CAP_DAYS,
            compute_budget_secs: DEFAULT_COMPUTE_BUDGET_SECS,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            benchmark_ticker: DEFAULT_BENCHMARK_TICKER.to_string(),
            initial_balance: DEFAULT_INITIAL_BALANCE,
            price_cache_ttl_secs: DEFAULT_PRICE_CACHE_TTL_SECS,
            calendar_start_year: DEFAULT_CALENDAR_START_YEAR,
        }
    }
}

impl PerformanceSettings {
    /// Defaults overridden by `ALPHABOARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known key.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        override_parsed(&lookup, ENV_LOOKBACK_CAP_DAYS, &mut settings.lookback_cap_days);
        override_parsed(&lookup, ENV_COMPUTE_BUDGET_SECS, &mut settings.compute_budget_secs);
        override_parsed(
            &lookup,
            ENV_PROVIDER_TIMEOUT_SECS,
            &mut settings.provider_timeout_secs,
        );
        override_parsed(&lookup, ENV_RISK_FREE_RATE, &mut settings.risk_free_rate);
        override_parsed(&lookup, ENV_INITIAL_BALANCE, &mut settings.initial_balance);
        override_parsed(
            &lookup,
            ENV_PRICE_CACHE_TTL_SECS,
            &mut settings.price_cache_ttl_secs,
        );
        override_parsed(
            &lookup,
            ENV_CALENDAR_START_YEAR,
            &mut settings.calendar_start_year,
        );

        if let Some(ticker) = lookup(ENV_BENCHMARK_TICKER) {
            let ticker = ticker.trim();
            if !ticker.is_empty() {
                settings.benchmark_ticker = ticker.to_string();
            }
        }

        if settings.lookback_cap_days <= 0 {
            warn!(
                "{} must be positive, falling back to {}",
                ENV_LOOKBACK_CAP_DAYS, DEFAULT_LOOKBACK_CAP_DAYS
            );
            settings.lookback_cap_days = DEFAULT_LOOKBACK_CAP_DAYS;
        } else if settings.lookback_cap_days > MAX_LOOKBACK_CAP_DAYS {
            warn!(
                "{} exceeds {}, clamping",
                ENV_LOOKBACK_CAP_DAYS, MAX_LOOKBACK_CAP_DAYS
            );
            settings.lookback_cap_days = MAX_LOOKBACK_CAP_DAYS;
        }

        settings
    }

    /// Lookback cap bounded to `1..=MAX_LOOKBACK_CAP_DAYS`, whatever the
    /// field was set to.
    pub fn lookback_cap(&self) -> i64 {
        self.lookback_cap_days.clamp(1, MAX_LOOKBACK_CAP_DAYS)
    }

    pub fn compute_budget(&self) -> Duration {
        Duration::from_secs(self.compute_budget_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn price_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.price_cache_ttl_secs)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring unparsable value '{}' for {}", raw, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = PerformanceSettings::default();
        assert_eq!(settings.lookback_cap_days, 730);
        assert_eq!(settings.compute_budget_secs, 30);
        assert_eq!(settings.risk_free_rate, dec!(0.05));
        assert_eq!(settings.benchmark_ticker, "^NSEI");
        assert_eq!(settings.initial_balance, dec!(1000000));
        assert_eq!(settings.price_cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_lookup_overrides_known_keys() {
        let settings = PerformanceSettings::from_lookup(lookup_from(&[
            (ENV_LOOKBACK_CAP_DAYS, "365"),
            (ENV_RISK_FREE_RATE, "0.065"),
            (ENV_BENCHMARK_TICKER, " ^BSESN "),
        ]));
        assert_eq!(settings.lookback_cap_days, 365);
        assert_eq!(settings.risk_free_rate, dec!(0.065));
        assert_eq!(settings.benchmark_ticker, "^BSESN");
        assert_eq!(settings.compute_budget_secs, 30);
    }

    #[test]
    fn test_unparsable_values_are_ignored() {
        let settings = PerformanceSettings::from_lookup(lookup_from(&[
            (ENV_COMPUTE_BUDGET_SECS, "soon"),
            (ENV_LOOKBACK_CAP_DAYS, "-5"),
        ]));
        assert_eq!(settings.compute_budget_secs, 30);
        assert_eq!(settings.lookback_cap_days, 730);
    }

    #[test]
    fn test_oversized_lookback_is_clamped() {
        let settings = PerformanceSettings::from_lookup(lookup_from(&[(
            ENV_LOOKBACK_CAP_DAYS,
            "9223372036854775807",
        )]));
        assert_eq!(settings.lookback_cap_days, MAX_LOOKBACK_CAP_DAYS);

        let deserialized: PerformanceSettings =
            serde_json::from_str(r#"{"lookbackCapDays": 9223372036854775807}"#).unwrap();
        assert_eq!(deserialized.lookback_cap(), MAX_LOOKBACK_CAP_DAYS);

        let zero = PerformanceSettings {
            lookback_cap_days: 0,
            ..PerformanceSettings::default()
        };
        assert_eq!(zero.lookback_cap(), 1);
    }

    #[test]
    fn test_deserialize_partial_json_uses_defaults() {
        let settings: PerformanceSettings =
            serde_json::from_str(r#"{"lookbackCapDays": 90}"#).unwrap();
        assert_eq!(settings.lookback_cap_days, 90);
        assert_eq!(settings.benchmark_ticker, "^NSEI");
    }
}
