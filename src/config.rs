use std::time::Duration;

use serde::Deserialize;

use crate::analytics::date_range::clamp_window;

pub const DEFAULT_SESSION_COOKIE: &str = "infra_manager_session";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server origin, e.g. `http://localhost:8080`. Admin routes live under `/admin`.
    pub base_url: String,
    /// Session cookie value presented on every request, if already signed in.
    pub session: Option<String>,
    pub session_cookie: String,
    /// Lookback window used when a command does not pass `--days`.
    /// Set via INFRA_CONSOLE_WINDOW_DAYS. Default: 7.
    pub window_days: u32,
    /// Whole-request timeout in seconds. None = requests run to completion.
    /// Set via INFRA_CONSOLE_TIMEOUT_SECS.
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Config pointing at `base_url` with every other field at its default.
    pub fn for_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            window_days: 7,
            timeout_secs: None,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("INFRA_CONSOLE_URL")
        .unwrap_or_else(|_| "http://localhost:8080".into());
    url::Url::parse(&base_url)
        .map_err(|e| anyhow::anyhow!("INFRA_CONSOLE_URL is not a valid URL ({}): {}", base_url, e))?;

    Ok(Config {
        base_url,
        session: std::env::var("INFRA_CONSOLE_SESSION")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        session_cookie: std::env::var("INFRA_CONSOLE_SESSION_COOKIE")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.into()),
        window_days: std::env::var("INFRA_CONSOLE_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .map(clamp_window)
            .unwrap_or(7),
        timeout_secs: std::env::var("INFRA_CONSOLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0),
    })
}
