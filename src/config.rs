use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::FixedOffset;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "clinic-scheduler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Clinic civil zone: UTC-3, no daylight saving.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

pub const ENV_BIND_ADDR: &str = "CLINIC_BIND_ADDR";
pub const ENV_DB_PATH: &str = "CLINIC_DB_PATH";
pub const ENV_UTC_OFFSET: &str = "CLINIC_UTC_OFFSET_MINUTES";

/// Log filter used when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,clinic_scheduler=debug,tower_http=info"
}

/// Get the application data directory.
/// Falls back to the working directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the scheduling database
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var} must be a whole number of minutes: {value}")]
    InvalidOffset { var: &'static str, value: String },

    #[error("UTC offset out of range: {0} minutes")]
    OffsetOutOfRange(i32),
}

/// Runtime settings resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub utc_offset: FixedOffset,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: ENV_BIND_ADDR,
                value: bind_raw.clone(),
            })?;

        let db_path = lookup(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let offset_minutes = match lookup(ENV_UTC_OFFSET) {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidOffset {
                    var: ENV_UTC_OFFSET,
                    value: raw.clone(),
                })?,
            None => DEFAULT_UTC_OFFSET_MINUTES,
        };
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or(ConfigError::OffsetOutOfRange(offset_minutes))?;

        Ok(Self {
            bind_addr,
            db_path,
            utc_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_empty() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.utc_offset.local_minus_utc(), -3 * 3600);
        assert!(settings.db_path.ends_with("clinic.db"));
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_BIND_ADDR, "0.0.0.0:9090"),
            (ENV_DB_PATH, "/tmp/clinic-test.db"),
            (ENV_UTC_OFFSET, "60"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_addr.port(), 9090);
        assert_eq!(settings.db_path, PathBuf::from("/tmp/clinic-test.db"));
        assert_eq!(settings.utc_offset.local_minus_utc(), 3600);
    }

    #[test]
    fn bad_bind_addr_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_BIND_ADDR, "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    }

    #[test]
    fn bad_offset_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_UTC_OFFSET, "-3h")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOffset { .. }));

        let err = Settings::from_lookup(lookup_from(&[(ENV_UTC_OFFSET, "2000")])).unwrap_err();
        assert!(matches!(err, ConfigError::OffsetOutOfRange(2000)));
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with(APP_NAME));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
