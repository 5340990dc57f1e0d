use std::env;
use std::time::Duration;

use volo_agents::DEFAULT_ASSISTANT_TIMEOUT;
use volo_ml::OpenAiConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_API_KEY: &str = "dev-volo-key";

/// Service settings. `Default` gives the documented defaults without reading
/// the environment; `from_env` applies `VOLO_*` overrides on top.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub api_key: String,
    pub database_url: Option<String>,
    pub openai: Option<OpenAiConfig>,
    pub assistant_timeout: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            database_url: None,
            openai: None,
            assistant_timeout: DEFAULT_ASSISTANT_TIMEOUT,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            allowed_origins: default_origins(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind: env::var("VOLO_BIND").unwrap_or(defaults.bind),
            api_key: non_empty_var("VOLO_API_KEY").unwrap_or(defaults.api_key),
            database_url: non_empty_var("VOLO_DATABASE_URL"),
            openai: OpenAiConfig::from_env(),
            assistant_timeout: env::var("VOLO_ASSISTANT_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.assistant_timeout),
            rate_limit_window: env::var("VOLO_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env::var("VOLO_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
            allowed_origins: env::var("VOLO_ALLOWED_ORIGINS")
                .ok()
                .map(|value| parse_origins(&value))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_origins() -> Vec<String> {
    ["http://localhost:3000", "http://127.0.0.1:3000"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" https://volo.dz/, ,http://localhost:3000"),
            vec!["https://volo.dz".to_string(), "http://localhost:3000".to_string()]
        );
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ApiConfig::default();
        assert_eq!(config.api_key, "dev-volo-key");
        assert_eq!(config.assistant_timeout, Duration::from_millis(15_000));
        assert_eq!(config.rate_limit_max, 120);
        assert!(config.openai.is_none());
    }
}
