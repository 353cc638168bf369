use std::time::Duration;

use melody_suno::api::DEFAULT_BASE_URL;
use melody_telegram::bot::DEFAULT_API_URL;

/// Errors produced while reading configuration from the environment.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Credentials and the public callback URL are required; everything else
/// has a default suitable for a single-host deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Telegram bot token.
    pub bot_token: String,
    /// Suno API bearer token.
    pub suno_api_key: String,
    /// Public URL of `POST /suno-callback`, sent with every submission.
    pub callback_url: String,
    pub suno_base_url: String,
    pub telegram_api_url: String,
    /// Delay before the watchdog polls a task (default: `180`).
    pub poll_grace_secs: u64,
    /// Deadline for downloading a produced track (default: `120`).
    pub audio_fetch_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `BOT_TOKEN`                | required                         |
    /// | `SUNO_API_KEY`             | required                         |
    /// | `CALLBACK_URL`             | required                         |
    /// | `SUNO_BASE_URL`            | `https://api.sunoapi.org/api/v1` |
    /// | `TELEGRAM_API_URL`         | `https://api.telegram.org`       |
    /// | `HOST`                     | `0.0.0.0`                        |
    /// | `PORT`                     | `8080`                           |
    /// | `POLL_GRACE_SECS`          | `180`                            |
    /// | `AUDIO_FETCH_TIMEOUT_SECS` | `120`                            |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: optional("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 8080)?,
            request_timeout_secs: parse(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            bot_token: required("BOT_TOKEN")?,
            suno_api_key: required("SUNO_API_KEY")?,
            callback_url: required("CALLBACK_URL")?,
            suno_base_url: optional("SUNO_BASE_URL", DEFAULT_BASE_URL),
            telegram_api_url: optional("TELEGRAM_API_URL", DEFAULT_API_URL),
            poll_grace_secs: parse(&lookup, "POLL_GRACE_SECS", 180)?,
            audio_fetch_timeout_secs: parse(&lookup, "AUDIO_FETCH_TIMEOUT_SECS", 120)?,
        })
    }

    pub fn poll_grace(&self) -> Duration {
        Duration::from_secs(self.poll_grace_secs)
    }

    pub fn audio_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.audio_fetch_timeout_secs)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
