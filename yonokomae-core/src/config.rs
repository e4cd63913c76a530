//! Environment-driven configuration surface.
//!
//! All knobs are optional with stated defaults. Parsing is done by pure
//! functions over `Option<&str>` so it can be tested without touching the
//! process environment.

use std::time::Duration;

pub const ENV_TEST_MODE: &str = "YK_TEST_MODE";
pub const ENV_CACHE_LOG: &str = "YK_CACHE_LOG";
pub const ENV_TIMING_LOG: &str = "YK_TIMING_LOG";
pub const ENV_JUDGEMENT_TTL_MS: &str = "YK_JUDGEMENT_TTL_MS";
pub const ENV_JUDGEMENT_CACHE_SIZE: &str = "YK_JUDGEMENT_CACHE_SIZE";
pub const ENV_API_BASE_URL: &str = "YK_API_BASE_URL";
pub const ENV_REMOTE_WEIGHT: &str = "YK_REMOTE_WEIGHT";
pub const ENV_REMOTE_TTL_MS: &str = "YK_REMOTE_TTL_MS";

const DEFAULT_JUDGEMENT_TTL_MS: u64 = 60_000;
const DEFAULT_JUDGEMENT_CACHE_SIZE: usize = 100;
const DEFAULT_API_BASE_URL: &str = "https://yonokomae.example/api";
const DEFAULT_REMOTE_WEIGHT: f64 = 0.3;
const DEFAULT_REMOTE_TTL_MS: u64 = 300_000;

/// Execution mode. In `Test` mode artificial delays are skipped entirely and
/// the judgement cache TTL is forced to zero so tests stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Normal,
    Test,
}

/// Resolved configuration handed to the repository factory.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub exec_mode: ExecMode,
    pub cache_log: bool,
    pub timing_log: bool,
    pub judgement_ttl: Duration,
    pub judgement_cache_size: usize,
    pub api_base_url: String,
    pub remote_weight: f64,
    pub remote_ttl: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            exec_mode: ExecMode::Normal,
            cache_log: false,
            timing_log: false,
            judgement_ttl: Duration::from_millis(DEFAULT_JUDGEMENT_TTL_MS),
            judgement_cache_size: DEFAULT_JUDGEMENT_CACHE_SIZE,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            remote_weight: DEFAULT_REMOTE_WEIGHT,
            remote_ttl: Duration::from_millis(DEFAULT_REMOTE_TTL_MS),
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok();
        Self::from_values(
            var(ENV_TEST_MODE).as_deref(),
            var(ENV_CACHE_LOG).as_deref(),
            var(ENV_TIMING_LOG).as_deref(),
            var(ENV_JUDGEMENT_TTL_MS).as_deref(),
            var(ENV_JUDGEMENT_CACHE_SIZE).as_deref(),
            var(ENV_API_BASE_URL).as_deref(),
            var(ENV_REMOTE_WEIGHT).as_deref(),
            var(ENV_REMOTE_TTL_MS).as_deref(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_values(
        test_mode: Option<&str>,
        cache_log: Option<&str>,
        timing_log: Option<&str>,
        judgement_ttl_ms: Option<&str>,
        judgement_cache_size: Option<&str>,
        api_base_url: Option<&str>,
        remote_weight: Option<&str>,
        remote_ttl_ms: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            exec_mode: if parse_bool(test_mode, false) {
                ExecMode::Test
            } else {
                ExecMode::Normal
            },
            cache_log: parse_bool(cache_log, defaults.cache_log),
            timing_log: parse_bool(timing_log, defaults.timing_log),
            judgement_ttl: Duration::from_millis(parse_u64(
                judgement_ttl_ms,
                DEFAULT_JUDGEMENT_TTL_MS,
            )),
            judgement_cache_size: parse_u64(
                judgement_cache_size,
                DEFAULT_JUDGEMENT_CACHE_SIZE as u64,
            ) as usize,
            api_base_url: api_base_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map_or_else(|| defaults.api_base_url.clone(), str::to_string),
            remote_weight: parse_f64(remote_weight, DEFAULT_REMOTE_WEIGHT).clamp(0.0, 1.0),
            remote_ttl: Duration::from_millis(parse_u64(remote_ttl_ms, DEFAULT_REMOTE_TTL_MS)),
        }
    }

    /// TTL actually applied to the judgement cache; zero in test mode.
    #[must_use]
    pub fn effective_judgement_ttl(&self) -> Duration {
        match self.exec_mode {
            ExecMode::Normal => self.judgement_ttl,
            ExecMode::Test => Duration::ZERO,
        }
    }

    #[must_use]
    pub fn test_mode(mut self) -> Self {
        self.exec_mode = ExecMode::Test;
        self
    }
}

/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively.
/// Anything else falls back to `default`.
#[must_use]
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    let Some(raw) = value else { return default };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_f64(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|parsed| parsed.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_documented_spellings() {
        for yes in ["1", "true", "YES", " On "] {
            assert!(parse_bool(Some(yes), false), "{yes} should parse true");
        }
        for no in ["0", "false", "No", "OFF"] {
            assert!(!parse_bool(Some(no), true), "{no} should parse false");
        }
        assert!(parse_bool(Some("maybe"), true));
        assert!(!parse_bool(Some("maybe"), false));
        assert!(parse_bool(None, true));
    }

    #[test]
    fn defaults_are_stable() {
        let config = CoreConfig::default();
        assert_eq!(config.judgement_ttl, Duration::from_secs(60));
        assert_eq!(config.judgement_cache_size, 100);
        assert_eq!(config.remote_weight, 0.3);
        assert_eq!(config.exec_mode, ExecMode::Normal);
        assert!(!config.cache_log);
    }

    #[test]
    fn from_values_overrides_and_clamps() {
        let config = CoreConfig::from_values(
            Some("yes"),
            Some("on"),
            Some("garbage"),
            Some("1500"),
            Some("8"),
            Some("  https://api.test/v1  "),
            Some("7.5"),
            Some("not-a-number"),
        );
        assert_eq!(config.exec_mode, ExecMode::Test);
        assert!(config.cache_log);
        assert!(!config.timing_log, "garbage falls back to default");
        assert_eq!(config.judgement_ttl, Duration::from_millis(1500));
        assert_eq!(config.judgement_cache_size, 8);
        assert_eq!(config.api_base_url, "https://api.test/v1");
        assert_eq!(config.remote_weight, 1.0, "weight clamps to [0, 1]");
        assert_eq!(config.remote_ttl, Duration::from_millis(300_000));
    }

    #[test]
    fn test_mode_forces_zero_ttl() {
        let config = CoreConfig::default().test_mode();
        assert_eq!(config.effective_judgement_ttl(), Duration::ZERO);
        assert_eq!(
            CoreConfig::default().effective_judgement_ttl(),
            Duration::from_secs(60)
        );
    }
}
