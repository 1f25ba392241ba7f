use std::path::Path;
use std::time::Duration;

use soletrando_core::{GAME_WS_PATH, STATE_PATH};
use url::Url;

use crate::error::ConfigError;

pub const BACKEND_URL_ENV: &str = "SOLETRANDO_BACKEND_URL";
pub const LEGACY_BACKEND_URL_ENV: &str = "VITE_BACKEND_URL";
pub const RECONNECT_MS_ENV: &str = "SOLETRANDO_RECONNECT_MS";
pub const POLL_MS_ENV: &str = "SOLETRANDO_POLL_MS";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_NOTICE_CAPACITY: usize = 32;

/// HTTP base of the backend and the push endpoint derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoints {
    http_base: Url,
    ws_url: Url,
}

impl BackendEndpoints {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let mut http_base = Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
            url: trimmed.to_string(),
            source,
        })?;
        http_base.set_query(None);
        http_base.set_fragment(None);
        let ws_scheme = match http_base.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        let mut ws_url = http_base.clone();
        ws_url
            .set_scheme(ws_scheme)
            .map_err(|_| ConfigError::UnsupportedScheme(ws_scheme.to_string()))?;
        let base_path = http_base.path().trim_end_matches('/');
        ws_url.set_path(&format!("{base_path}{GAME_WS_PATH}"));
        Ok(Self { http_base, ws_url })
    }

    pub fn ws_url(&self) -> &Url {
        &self.ws_url
    }

    pub fn state_url(&self) -> Url {
        self.http_url(STATE_PATH)
    }

    /// `path` is appended to the base path, so a backend mounted under a
    /// prefix (`http://host/soletrando`) keeps its prefix.
    pub fn http_url(&self, path: &str) -> Url {
        let mut url = self.http_base.clone();
        let base_path = self.http_base.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{path}"));
        url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub reconnect_delay: Duration,
    /// Periodic pulls on top of the push connection. `None` or zero disables
    /// polling.
    pub poll_interval: Option<Duration>,
    pub notice_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: RECONNECT_DELAY,
            poll_interval: None,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

impl SyncOptions {
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval.filter(|interval| !interval.is_zero());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub backend: BackendEndpoints,
    pub sync: SyncOptions,
}

impl SyncConfig {
    pub fn new(backend_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            backend: BackendEndpoints::parse(backend_url)?,
            sync: SyncOptions::default(),
        })
    }

    /// Reads the backend url and tuning knobs from the process environment,
    /// after loading `.env.local` and `.env` from the working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv(Path::new("."));
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .or_else(|_| std::env::var(LEGACY_BACKEND_URL_ENV))
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let mut config = Self::new(&backend_url)?;
        if let Some(ms) = env_millis(RECONNECT_MS_ENV)? {
            config.sync = config.sync.with_reconnect_delay(ms);
        }
        if let Some(ms) = env_millis(POLL_MS_ENV)? {
            config.sync = config.sync.with_poll_interval(Some(ms));
        }
        Ok(config)
    }
}

/// Variables already set in the process win over both files.
pub fn load_dotenv(dir: &Path) {
    let _ = dotenvy::from_filename(dir.join(".env.local"));
    let _ = dotenvy::from_filename(dir.join(".env"));
}

fn env_millis(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    parse_millis(key, &raw)
}

pub(crate) fn parse_millis(key: &'static str, raw: &str) -> Result<Option<Duration>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: trimmed.to_string(),
        })
}
