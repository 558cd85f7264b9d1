use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use chrono_tz::Tz;
use serde::Deserialize;
use shared::domain::Venue;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "teetime.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub webdriver_url: String,
    pub venue: String,
    pub timezone: String,
    pub element_timeout_seconds: u64,
    pub settle_millis: u64,
    pub headless: bool,
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            webdriver_url: "http://localhost:9515".into(),
            venue: "mission".into(),
            timezone: "America/Los_Angeles".into(),
            element_timeout_seconds: 30,
            settle_millis: 1000,
            headless: false,
            pushover_token: None,
            pushover_user: None,
        }
    }
}

/// Keys accepted in `teetime.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    webdriver_url: Option<String>,
    venue: Option<String>,
    timezone: Option<String>,
    element_timeout_seconds: Option<u64>,
    settle_millis: Option<u64>,
    headless: Option<bool>,
    pushover_token: Option<String>,
    pushover_user: Option<String>,
}

impl Settings {
    pub fn zone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("unknown timezone '{}': {e}", self.timezone))
    }

    pub fn venue(&self) -> anyhow::Result<Venue> {
        self.venue.parse::<Venue>().map_err(|e| anyhow!(e))
    }

    pub fn webdriver_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.webdriver_url)
            .with_context(|| format!("invalid webdriver url '{}'", self.webdriver_url))
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_seconds)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if it parses, then the environment.
pub(crate) fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__WEBDRIVER_URL") {
        settings.webdriver_url = v;
    }
    if let Some(v) = env("APP__VENUE") {
        settings.venue = v;
    }
    if let Some(v) = env("APP__TIMEZONE") {
        settings.timezone = v;
    }
    if let Some(parsed) = env("APP__ELEMENT_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
        settings.element_timeout_seconds = parsed;
    }
    if let Some(parsed) = env("APP__SETTLE_MILLIS").and_then(|v| v.parse().ok()) {
        settings.settle_millis = parsed;
    }
    if let Some(v) = env("APP__HEADLESS") {
        settings.headless = matches!(v.trim(), "1" | "true" | "yes");
    }

    if let Some(v) = env("PUSHOVER_TOKEN") {
        settings.pushover_token = Some(v);
    }
    if let Some(v) = env("APP__PUSHOVER_TOKEN") {
        settings.pushover_token = Some(v);
    }

    if let Some(v) = env("PUSHOVER_USER") {
        settings.pushover_user = Some(v);
    }
    if let Some(v) = env("APP__PUSHOVER_USER") {
        settings.pushover_user = Some(v);
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.webdriver_url {
        settings.webdriver_url = v;
    }
    if let Some(v) = file_cfg.venue {
        settings.venue = v;
    }
    if let Some(v) = file_cfg.timezone {
        settings.timezone = v;
    }
    if let Some(v) = file_cfg.element_timeout_seconds {
        settings.element_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.settle_millis {
        settings.settle_millis = v;
    }
    if let Some(v) = file_cfg.headless {
        settings.headless = v;
    }
    if file_cfg.pushover_token.is_some() {
        settings.pushover_token = file_cfg.pushover_token;
    }
    if file_cfg.pushover_user.is_some() {
        settings.pushover_user = file_cfg.pushover_user;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
