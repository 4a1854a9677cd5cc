//! Configuration for the Idokep uploader.
//!
//! Options are read from an optional TOML/YAML file and then overridden by
//! `IDOKEP_*` environment variables (e.g. `IDOKEP_PASSWORD`), using the
//! `config` crate. Keys are flat and match the option names below.
//!
//! Required options:
//! - `username` -- Idokep account name
//! - `password` -- Idokep account password
//!
//! Optional options:
//! - `station_type` -- station type tag sent as `tipus` (default `WS23XX`)
//! - `server_url` -- upload endpoint (default `https://pro.idokep.hu/sendws.php`)
//! - `skip_upload` -- format and log requests without sending (default `false`)
//! - `post_interval` -- minimum seconds between posts (default `300`)
//! - `max_backlog` -- records kept queued before the oldest are dropped (default unbounded)
//! - `stale` -- seconds after which a record is too old to send (default disabled, `0` also disables)
//! - `timeout` -- seconds to wait for the server (default `60`)
//! - `max_tries` -- attempts per record (default `3`)
//! - `retry_wait` -- seconds between attempts (default `5`)
//! - `log_success` / `log_failure` -- log each outcome (default `true`)
//! - `success_marker` -- phrase the response body must contain (default `sz!`)

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::uploader::WorkerPolicy;

/// Default upload endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://pro.idokep.hu/sendws.php";

/// Default station type tag.
pub const DEFAULT_STATION_TYPE: &str = "WS23XX";

/// Default success phrase looked for in the response body.
pub const DEFAULT_SUCCESS_MARKER: &str = "sz!";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "IDOKEP";

/// Values the extension installer writes into a fresh configuration.
const PLACEHOLDERS: [&str; 2] = ["INSERT_USERNAME_HERE", "INSERT_PASSWORD_HERE"];

/// Validated uploader configuration, fixed for the worker's lifetime.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Idokep account name (`user`).
    pub username: String,
    /// Idokep account password (`pass`).
    pub password: String,
    /// Station type tag (`tipus`).
    pub station_type: String,
    /// Upload endpoint.
    pub server_url: Url,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Phrase that marks an accepted upload.
    pub success_marker: String,
    /// Queueing, throttling and retry policy for the worker.
    pub policy: WorkerPolicy,
}

/// Raw options as they appear in the configuration sources.
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    #[serde(default = "default_station_type")]
    station_type: String,
    #[serde(default = "default_server_url")]
    server_url: String,
    #[serde(default)]
    skip_upload: bool,
    #[serde(default = "default_post_interval")]
    post_interval: u64,
    #[serde(default)]
    max_backlog: Option<usize>,
    #[serde(default)]
    stale: Option<u64>,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_max_tries")]
    max_tries: u32,
    #[serde(default = "default_retry_wait")]
    retry_wait: u64,
    #[serde(default = "default_true")]
    log_success: bool,
    #[serde(default = "default_true")]
    log_failure: bool,
    #[serde(default = "default_success_marker")]
    success_marker: String,
}

impl UploaderConfig {
    /// Load configuration from an optional file plus `IDOKEP_*` environment
    /// variables. A missing file is not an error; missing credentials are.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be parsed,
    /// [`ConfigError::MissingOption`] if credentials are absent, or
    /// [`ConfigError::Invalid`] if an option value is unusable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`UploaderConfig::load`], with `env` standing in for the process
    /// environment when given.
    ///
    /// Environment values stay strings until deserialized into their field,
    /// so credentials such as `0123` or `true` arrive untouched.
    fn load_with_env(
        path: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?;
        let raw: RawConfig = settings.try_deserialize()?;
        raw.validate()
    }

    /// Parse configuration from a string in the given format, without
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Same as [`UploaderConfig::load`].
    pub fn parse(contents: &str, format: config::FileFormat) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, format))
            .build()?;
        let raw: RawConfig = settings.try_deserialize()?;
        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<UploaderConfig, ConfigError> {
        let username = required("username", self.username)?;
        let password = required("password", self.password)?;

        let server_url = Url::parse(&self.server_url).map_err(|e| ConfigError::Invalid {
            name: "server_url",
            reason: e.to_string(),
        })?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "server_url",
                reason: format!("unsupported scheme {}", server_url.scheme()),
            });
        }

        if self.max_tries == 0 {
            return Err(ConfigError::Invalid {
                name: "max_tries",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid {
                name: "timeout",
                reason: "must be at least 1 second".to_owned(),
            });
        }
        if self.success_marker.is_empty() {
            return Err(ConfigError::Invalid {
                name: "success_marker",
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(UploaderConfig {
            username,
            password,
            station_type: self.station_type,
            server_url,
            timeout: Duration::from_secs(self.timeout),
            success_marker: self.success_marker,
            policy: WorkerPolicy {
                post_interval: Duration::from_secs(self.post_interval),
                max_backlog: self.max_backlog,
                stale: self.stale.filter(|s| *s > 0).map(Duration::from_secs),
                max_tries: self.max_tries,
                retry_wait: Duration::from_secs(self.retry_wait),
                skip_upload: self.skip_upload,
                log_success: self.log_success,
                log_failure: self.log_failure,
            },
        })
    }
}

/// Reject absent, blank and placeholder credentials.
fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() && !PLACEHOLDERS.contains(&v.as_str()) => Ok(v),
        _ => Err(ConfigError::MissingOption(name)),
    }
}

fn default_station_type() -> String {
    DEFAULT_STATION_TYPE.to_owned()
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_owned()
}

const fn default_post_interval() -> u64 {
    300
}

const fn default_timeout() -> u64 {
    60
}

const fn default_max_tries() -> u32 {
    3
}

const fn default_retry_wait() -> u64 {
    5
}

const fn default_true() -> bool {
    true
}

fn default_success_marker() -> String {
    DEFAULT_SUCCESS_MARKER.to_owned()
}
