use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "roadmap-cli";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub polling: PollingSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub session_cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            session_cookie: None,
            csrf_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub poll_interval_secs: u64,
    pub max_poll_duration_secs: u64,
    pub refresh_interval_secs: u64,
    pub refresh_window_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            max_poll_duration_secs: 2 * 60 * 60,
            refresh_interval_secs: 30,
            refresh_window_secs: 30 * 60,
        }
    }
}

/// Timing bounds for the poll and refresh sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub poll_interval: Duration,
    pub max_poll_duration: Duration,
    pub refresh_interval: Duration,
    pub refresh_window: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        PollingSettings::default().timings()
    }
}

impl PollingSettings {
    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_duration: Duration::from_secs(self.max_poll_duration_secs),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            refresh_window: Duration::from_secs(self.refresh_window_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn selections_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join(APP_DIR).join("selections.json")))
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.server.base_url)
            .with_context(|| format!("server.base_url is not a valid URL: {}", self.server.base_url))?;

        let polling = &self.polling;
        for (name, value) in [
            ("polling.poll_interval_secs", polling.poll_interval_secs),
            ("polling.max_poll_duration_secs", polling.max_poll_duration_secs),
            ("polling.refresh_interval_secs", polling.refresh_interval_secs),
            ("polling.refresh_window_secs", polling.refresh_window_secs),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }

        if polling.refresh_interval_secs >= polling.refresh_window_secs {
            anyhow::bail!(
                "polling.refresh_interval_secs ({}) must be shorter than polling.refresh_window_secs ({})",
                polling.refresh_interval_secs,
                polling.refresh_window_secs
            );
        }
        Ok(())
    }
}
