use solar_core::{AnalysisConfig, RetryPolicy};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the Gemini vision model
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
}

/// Server configuration read from the environment
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// `None` when no API key is set; analyses then use the fallback path
    pub gemini: Option<GeminiSettings>,
    pub analysis: AnalysisConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            gemini: None,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = RetryPolicy::default();

        let gemini = read("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            model: read("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_url: read("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_or(
                read("SOLAR_AI_TIMEOUT_SECS"),
                "SOLAR_AI_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        });

        Self {
            bind_addr: read("SOLAR_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gemini,
            analysis: AnalysisConfig {
                retry: RetryPolicy {
                    max_attempts: parse_or(
                        read("SOLAR_AI_MAX_ATTEMPTS"),
                        "SOLAR_AI_MAX_ATTEMPTS",
                        defaults.max_attempts,
                    ),
                    backoff_unit_ms: parse_or(
                        read("SOLAR_AI_BACKOFF_MS"),
                        "SOLAR_AI_BACKOFF_MS",
                        defaults.backoff_unit_ms,
                    ),
                },
                ..AnalysisConfig::default()
            },
        }
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.gemini.is_none());
        assert_eq!(config.analysis.retry.max_attempts, 3);
        assert_eq!(config.analysis.retry.backoff_unit_ms, 2000);
    }

    #[test]
    fn test_gemini_settings_from_environment() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_API_URL", "http://localhost:9000/v1/"),
            ("SOLAR_AI_TIMEOUT_SECS", "5"),
            ("SOLAR_AI_MAX_ATTEMPTS", "1"),
            ("SOLAR_BIND_ADDR", "127.0.0.1:8080"),
        ]);
        let gemini = config.gemini.unwrap();

        assert_eq!(gemini.api_key, "secret");
        assert_eq!(gemini.model, "gemini-2.5-flash");
        assert_eq!(gemini.api_url, "http://localhost:9000/v1");
        assert_eq!(gemini.timeout, Duration::from_secs(5));
        assert_eq!(config.analysis.retry.max_attempts, 1);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_blank_key_and_bad_numbers_fall_back() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("SOLAR_AI_BACKOFF_MS", "soon")]);

        assert!(config.gemini.is_none());
        assert_eq!(config.analysis.retry.backoff_unit_ms, 2000);
    }
}
