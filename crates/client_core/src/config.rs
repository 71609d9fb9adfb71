use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use url::Url;

use crate::reviews::MetricScale;

pub const DEFAULT_CONFIG_FILE: &str = "indica.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub session_path: Option<PathBuf>,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    pub metric_scale: Option<MetricScale>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".into(),
            session_path: None,
            request_timeout: Duration::from_secs(15),
            search_debounce: Duration::from_millis(500),
            metric_scale: None,
        }
    }
}

impl Settings {
    /// Validates the base URL and strips trailing slashes so paths can be
    /// appended with `format!`.
    pub fn normalized_base_url(&self) -> Result<String> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("unsupported api url scheme '{}'", parsed.scheme());
        }
        Ok(trimmed.to_string())
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(DEFAULT_CONFIG_FILE, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    config_path: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            if let Some(v) = file_cfg.get("api_base_url").and_then(|v| v.as_str()) {
                settings.api_base_url = v.to_string();
            }
            if let Some(v) = file_cfg.get("session_path").and_then(|v| v.as_str()) {
                settings.session_path = Some(PathBuf::from(v));
            }
            if let Some(v) = file_cfg
                .get("request_timeout_secs")
                .and_then(|v| v.as_integer())
            {
                settings.request_timeout = Duration::from_secs(v.max(1) as u64);
            }
            if let Some(v) = file_cfg.get("search_debounce_ms").and_then(|v| v.as_integer()) {
                settings.search_debounce = Duration::from_millis(v.max(0) as u64);
            }
            if let Some(v) = file_cfg.get("metric_scale").and_then(|v| v.as_str()) {
                settings.metric_scale = parse_metric_scale(v);
            }
        }
    }

    if let Some(v) = env("INDICA_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("INDICA_SESSION_PATH") {
        settings.session_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SESSION_PATH") {
        settings.session_path = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout = Duration::from_secs(parsed.max(1));
        }
    }

    if let Some(v) = env("APP__SEARCH_DEBOUNCE_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.search_debounce = Duration::from_millis(parsed);
        }
    }

    if let Some(v) = env("APP__METRIC_SCALE") {
        settings.metric_scale = parse_metric_scale(&v);
    }

    settings
}

/// `auto` (or anything unrecognized) leaves scale detection on.
pub fn parse_metric_scale(raw: &str) -> Option<MetricScale> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "percent" | "0-100" => Some(MetricScale::Percent),
        "stars" | "1-5" => Some(MetricScale::Stars),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
