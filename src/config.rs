//! Provider configuration.
//!
//! Loaded once at start-up from:
//!   ~/.config/vkg/provider.toml (optional)
//! overlaid with `VKG_*` environment variables, e.g. `VKG_TIME_ZONE`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_ATTENDEES: u32 = 25;
/// Google's alias for the user's main calendar
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_SOURCE_TITLE: &str = "vkg-provider";
const DEFAULT_SOURCE_URL: &str = "https://github.com/vkg/vkg-provider";

/// Configuration as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attendees")]
    pub max_attendees: u32,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_source_title")]
    pub source_title: String,
    #[serde(default = "default_source_url")]
    pub source_url: String,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attendees() -> u32 {
    DEFAULT_MAX_ATTENDEES
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_source_title() -> String {
    DEFAULT_SOURCE_TITLE.to_string()
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            time_zone: default_time_zone(),
            timeout_secs: default_timeout_secs(),
            max_attendees: default_max_attendees(),
            calendar_id: default_calendar_id(),
            api_base: default_api_base(),
            source_title: default_source_title(),
            source_url: default_source_url(),
        }
    }
}

/// Immutable, validated configuration shared by every request.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Zone used to interpret declared wall-clock times.
    pub time_zone: Tz,
    /// Upper bound for each remote call.
    pub timeout: Duration,
    pub max_attendees: u32,
    pub calendar_id: String,
    pub api_base: Url,
    /// Attribution stamped on every event written by the provider.
    pub source_title: String,
    pub source_url: String,
}

impl ProviderConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("vkg")
            .join("provider.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?, environment())
    }

    /// Read `path` if it exists, then let `env` override it.
    fn load_from(path: &Path, env: Environment) -> Result<Self> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        let time_zone: Tz = raw
            .time_zone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid time_zone {:?}: {}", raw.time_zone, e))?;

        if raw.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        let api_base = Url::parse(&raw.api_base)
            .with_context(|| format!("Invalid api_base {:?}", raw.api_base))?;
        if api_base.cannot_be_a_base() {
            bail!("Invalid api_base {:?}: not a base URL", raw.api_base);
        }

        Ok(ProviderConfig {
            time_zone,
            timeout: Duration::from_secs(raw.timeout_secs),
            max_attendees: raw.max_attendees,
            calendar_id: raw.calendar_id,
            api_base,
            source_title: raw.source_title,
            source_url: raw.source_url,
        })
    }
}

/// `VKG_TIME_ZONE`, `VKG_TIMEOUT_SECS` and so on.
fn environment() -> Environment {
    Environment::with_prefix("VKG").try_parsing(true)
}

/// Identification sent with every API request.
pub fn user_agent() -> String {
    format!(
        "{}/{} ({} {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_raw(RawConfig::default()).unwrap();

        assert_eq!(config.time_zone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_attendees, 25);
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.api_base.as_str(), "https://www.googleapis.com/calendar/v3");
    }

    #[test]
    fn test_rejects_unknown_time_zone() {
        let raw = RawConfig {
            time_zone: "Mars/Olympus_Mons".to_string(),
            ..RawConfig::default()
        };
        let err = ProviderConfig::from_raw(raw).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let raw = RawConfig {
            timeout_secs: 0,
            ..RawConfig::default()
        };
        assert!(ProviderConfig::from_raw(raw).is_err());
    }

    #[test]
    fn test_rejects_non_base_api_url() {
        let raw = RawConfig {
            api_base: "mailto:calendar@example.com".to_string(),
            ..RawConfig::default()
        };
        assert!(ProviderConfig::from_raw(raw).is_err());
    }

    #[test]
    fn test_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.toml");
        std::fs::write(&path, "time_zone = \"Europe/Paris\"\ntimeout_secs = 5\n").unwrap();

        let raw: RawConfig = Config::builder()
            .add_source(File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let config = ProviderConfig::from_raw(raw).unwrap();

        assert_eq!(config.time_zone, chrono_tz::Europe::Paris);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_attendees, 25);
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.toml");
        std::fs::write(&path, "time_zone = \"Europe/Paris\"\ntimeout_secs = 5\n").unwrap();

        let config = ProviderConfig::load_from(
            &path,
            env(&[
                ("VKG_TIMEOUT_SECS", "30"),
                ("VKG_CALENDAR_ID", "team@group.calendar.google.com"),
                ("GOOGLE_CLOUD_PROJECT", "vkg"),
            ]),
        )
        .unwrap();

        assert_eq!(config.time_zone, chrono_tz::Europe::Paris);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.max_attendees, 25);
    }

    #[test]
    fn test_environment_without_file() {
        let dir = tempfile::tempdir().unwrap();

        let config = ProviderConfig::load_from(
            &dir.path().join("missing.toml"),
            env(&[("VKG_TIME_ZONE", "America/New_York"), ("VKG_MAX_ATTENDEES", "10")]),
        )
        .unwrap();

        assert_eq!(config.time_zone, chrono_tz::America::New_York);
        assert_eq!(config.max_attendees, 10);
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_environment_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let err = ProviderConfig::load_from(
            &dir.path().join("missing.toml"),
            env(&[("VKG_TIMEOUT_SECS", "soon")]),
        )
        .unwrap_err();

        assert!(format!("{:#}", err).starts_with("Failed to load configuration"));
    }

    #[test]
    fn test_user_agent_names_the_provider() {
        assert!(user_agent().starts_with("vkg-provider/"));
    }
}
