//! # Configuration Management

//! This module handles the configuration loading for the IQX Dock Booking service.
//! It leverages the `config` crate to layer settings from:

//! * YAML configuration files (default.yaml plus an optional per run mode file such as development.yaml)
//! * Environment variables prefixed with `APP` (e.g. `APP__BACKEND__TIMEOUT_MS`)
//! * The legacy deployment variables `SAP_USER`, `SAP_PASS`, `PING_URL` and `DATABASE_URL`

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use config::{Config, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use crate::errors::{DockBookingError, DockBookingResult};

/// The complete set of configuration settings for the IQX Dock Booking service.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Settings for reaching the OData booking backend
    pub backend: BackendSettings,
    /// Constants used by the appointment booking sequence
    pub booking: BookingSettings,
    /// Settings for application logging
    pub logging: LoggingSettings,
    /// Settings for the self-ping keep-alive loop
    pub keep_alive: KeepAliveSettings,
    /// Settings of the conversation store, which lives outside the booking core
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// # Backend Settings

/// Connection settings for the OData booking backend
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL serving reads and CSRF token issuance (e.g. `https://host:8006`)
    pub read_base_url: String,
    /// Base URL receiving the appointment creation POST
    pub write_base_url: String,
    /// Basic-auth user name
    pub username: String,
    /// Basic-auth password
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Secret<String>,
    /// Skip TLS certificate validation. The backend runs with a self-signed certificate.
    pub accept_invalid_certs: bool,
    /// Per-call timeout (in milliseconds)
    pub timeout_ms: u64,
    /// How many times the idempotent token fetch may be attempted
    pub token_fetch_attempts: u32,
    /// Pause between token fetch attempts (in milliseconds)
    pub retry_delay_ms: u64,
    /// OData service exposing the slot listing (`ZDOCK_SLOT_TIMESet`)
    pub slot_service_path: String,
    /// OData service exposing the carrier directory (`ZDOCK_SLOT_CARRIERSet`)
    pub carrier_service_path: String,
    /// OData service exposing appointments (`AppointmentSet`)
    pub appointment_service_path: String,
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn validate(&self) -> DockBookingResult<()> {
        for (name, value) in [("read_base_url", &self.read_base_url), ("write_base_url", &self.write_base_url)] {
            Url::parse(value)
                .map_err(|e| DockBookingError::ConfigError(format!("backend.{} '{}' is not a valid URL: {}", name, value, e)))?;
        }
        if self.token_fetch_attempts == 0 {
            return Err(DockBookingError::ConfigError("backend.token_fetch_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingSettings {
    /// Date (DDMMYYYY) used for the token fetch; any date whose slot query succeeds will do
    pub reference_date: String,
    /// Means of transport sent with every appointment (`TRCK` for trucks)
    pub transport_mode: String,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// The logging level used when `RUST_LOG` is not set (e.g. "info", "debug")
    pub level: String,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
    /// Emit before/after events around every tool operation
    pub trace_operations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeepAliveSettings {
    /// Externally reachable URL of this service; the loop is disabled when absent
    pub url: Option<String>,
    pub interval_secs: u64,
    /// Per-ping timeout (in milliseconds)
    pub timeout_ms: u64,
}

impl KeepAliveSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseSettings {
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub url: Option<Secret<String>>,
}

/// # Settings Initialization
impl Settings {
    /// Loads and constructs the application settings.
    ///
    /// Sources, in order of precedence (later wins):
    ///
    /// 1. `default.yaml` (required)
    /// 2. `{RUN_MODE}.yaml`, where `RUN_MODE` defaults to `development` (optional)
    /// 3. Environment variables prefixed with `APP` and separated by `__`
    /// 4. `SAP_USER`, `SAP_PASS`, `PING_URL`, `DATABASE_URL`
    ///
    /// The `CONFIG_DIR` environment variable selects the directory holding the YAML files (defaults to "src/config").
    pub fn new() -> DockBookingResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "src/config".into());
        debug!("Run Mode: {:?}, Config Dir: {:?}", run_mode, config_dir);

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("backend.username", env::var("SAP_USER").ok())?
            .set_override_option("backend.password", env::var("SAP_PASS").ok())?
            .set_override_option("keep_alive.url", env::var("PING_URL").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(DockBookingError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        s.validate()?;
        debug!("{}", s);
        Ok(s)
    }

    /// Checks the invariants the services rely on
    pub fn validate(&self) -> DockBookingResult<()> {
        self.backend.validate()?;
        let date = &self.booking.reference_date;
        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DockBookingError::ConfigError(format!("booking.reference_date '{}' is not DDMMYYYY", date)));
        }
        if self.keep_alive.interval_secs == 0 {
            return Err(DockBookingError::ConfigError("keep_alive.interval_secs must be positive".to_string()));
        }
        if self.keep_alive.timeout_ms == 0 {
            return Err(DockBookingError::ConfigError("keep_alive.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Deserializes a secret string from configuration into a `Secret<String>`
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(Secret::new(s))
}

/// Deserializes an optional secret string from configuration into an `Option<Secret<String>>`
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.map(Secret::new))
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings {{ read_base_url: {}, write_base_url: {}, username: {}, password: [REDACTED], accept_invalid_certs: {}, timeout_ms: {}, token_fetch_attempts: {}, reference_date: {}, keep_alive_url: {:?}, database_url: {} }}",
            self.backend.read_base_url,
            self.backend.write_base_url,
            self.backend.username,
            self.backend.accept_invalid_certs,
            self.backend.timeout_ms,
            self.backend.token_fetch_attempts,
            self.booking.reference_date,
            self.keep_alive.url,
            if self.database.url.is_some() { "[REDACTED]" } else { "<unset>" },
        )
    }
}
