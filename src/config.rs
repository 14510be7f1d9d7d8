//! Application-level configuration loading: timeouts, polling cadence and export location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the service looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PADEL_FRONT_CONFIG_PATH";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ROOM_CREATION_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;
const DEFAULT_TRANSITION_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_EXPORT_DIR: &str = "exports";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    request_timeout: Duration,
    room_creation_timeout: Duration,
    poll_interval: Duration,
    transition_timeout: Duration,
    export_dir: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        poll_interval = ?app_config.poll_interval,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Per-request timeout applied by the backend client.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Upper bound for the room creation call.
    pub fn room_creation_timeout(&self) -> Duration {
        self.room_creation_timeout
    }

    /// Delay between two room watcher polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Upper bound for the backend call behind a confirmation transition.
    pub fn transition_timeout(&self) -> Duration {
        self.transition_timeout
    }

    /// Directory receiving exported log files.
    pub fn export_dir(&self) -> &PathBuf {
        &self.export_dir
    }

    /// Same configuration with a different poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Same configuration with a different room creation timeout.
    pub fn with_room_creation_timeout(mut self, timeout: Duration) -> Self {
        self.room_creation_timeout = timeout;
        self
    }

    /// Same configuration with a different export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every key is optional; zero durations are treated as absent.
struct RawConfig {
    #[serde(default)]
    request_timeout_ms: Option<u64>,
    #[serde(default)]
    room_creation_timeout_ms: Option<u64>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    transition_timeout_ms: Option<u64>,
    #[serde(default)]
    export_dir: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            request_timeout: millis_or(value.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS),
            room_creation_timeout: millis_or(
                value.room_creation_timeout_ms,
                DEFAULT_ROOM_CREATION_TIMEOUT_MS,
            ),
            poll_interval: millis_or(value.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS),
            transition_timeout: millis_or(
                value.transition_timeout_ms,
                DEFAULT_TRANSITION_TIMEOUT_MS,
            ),
            export_dir: value
                .export_dir
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR)),
        }
    }
}

fn millis_or(value: Option<u64>, default: u64) -> Duration {
    Duration::from_millis(value.filter(|ms| *ms > 0).unwrap_or(default))
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
