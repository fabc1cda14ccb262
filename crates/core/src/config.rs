use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::slots::SlotGrid;
use crate::policy::BookingWindow;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Policy constants shared by the availability engine and the ledger commit
/// path: the advance-booking horizon, the reservation-id format, and the
/// shape of the daily slot grid.
#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub horizon_days: i64,
    pub reservation_prefix: String,
    pub counter_floor: i64,
    pub first_slot: NaiveTime,
    pub last_slot: NaiveTime,
    pub slot_interval_minutes: u32,
}

impl BookingConfig {
    pub fn window(&self) -> BookingWindow {
        BookingWindow::new(self.horizon_days)
    }

    pub fn slot_grid(&self) -> SlotGrid {
        SlotGrid::generate(self.first_slot, self.last_slot, self.slot_interval_minutes)
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub horizon_days: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://maitred.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            booking: BookingConfig {
                horizon_days: 3,
                reservation_prefix: "TT".to_string(),
                counter_floor: 1000,
                first_slot: NaiveTime::from_hms_opt(11, 0, 0).expect("valid opening slot"),
                last_slot: NaiveTime::from_hms_opt(23, 0, 0).expect("valid closing slot"),
                slot_interval_minutes: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    booking: Option<BookingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    horizon_days: Option<i64>,
    reservation_prefix: Option<String>,
    counter_floor: Option<i64>,
    first_slot: Option<String>,
    last_slot: Option<String>,
    slot_interval_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("maitred.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(horizon_days) = booking.horizon_days {
                self.booking.horizon_days = horizon_days;
            }
            if let Some(reservation_prefix) = booking.reservation_prefix {
                self.booking.reservation_prefix = reservation_prefix;
            }
            if let Some(counter_floor) = booking.counter_floor {
                self.booking.counter_floor = counter_floor;
            }
            if let Some(first_slot) = booking.first_slot {
                self.booking.first_slot = parse_slot_time("booking.first_slot", &first_slot)?;
            }
            if let Some(last_slot) = booking.last_slot {
                self.booking.last_slot = parse_slot_time("booking.last_slot", &last_slot)?;
            }
            if let Some(slot_interval_minutes) = booking.slot_interval_minutes {
                self.booking.slot_interval_minutes = slot_interval_minutes;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MAITRED_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MAITRED_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("MAITRED_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MAITRED_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("MAITRED_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MAITRED_BOOKING_HORIZON_DAYS") {
            self.booking.horizon_days = parse_i64("MAITRED_BOOKING_HORIZON_DAYS", &value)?;
        }
        if let Some(value) = read_env("MAITRED_BOOKING_RESERVATION_PREFIX") {
            self.booking.reservation_prefix = value;
        }
        if let Some(value) = read_env("MAITRED_BOOKING_COUNTER_FLOOR") {
            self.booking.counter_floor = parse_i64("MAITRED_BOOKING_COUNTER_FLOOR", &value)?;
        }
        if let Some(value) = read_env("MAITRED_BOOKING_FIRST_SLOT") {
            self.booking.first_slot = parse_slot_time("MAITRED_BOOKING_FIRST_SLOT", &value)?;
        }
        if let Some(value) = read_env("MAITRED_BOOKING_LAST_SLOT") {
            self.booking.last_slot = parse_slot_time("MAITRED_BOOKING_LAST_SLOT", &value)?;
        }
        if let Some(value) = read_env("MAITRED_BOOKING_SLOT_INTERVAL_MINUTES") {
            self.booking.slot_interval_minutes =
                parse_u32("MAITRED_BOOKING_SLOT_INTERVAL_MINUTES", &value)?;
        }

        let log_level = read_env("MAITRED_LOGGING_LEVEL").or_else(|| read_env("MAITRED_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MAITRED_LOGGING_FORMAT").or_else(|| read_env("MAITRED_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(horizon_days) = overrides.horizon_days {
            self.booking.horizon_days = horizon_days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_booking(&self.booking)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("maitred.toml"), PathBuf::from("config/maitred.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if !(0..=60).contains(&booking.horizon_days) {
        return Err(ConfigError::Validation(
            "booking.horizon_days must be in range 0..=60".to_string(),
        ));
    }

    let prefix = booking.reservation_prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(
            "booking.reservation_prefix must be non-empty and alphabetic".to_string(),
        ));
    }

    if booking.counter_floor < 0 {
        return Err(ConfigError::Validation(
            "booking.counter_floor must not be negative".to_string(),
        ));
    }

    if booking.first_slot > booking.last_slot {
        return Err(ConfigError::Validation(
            "booking.first_slot must not be later than booking.last_slot".to_string(),
        ));
    }

    if !(5..=240).contains(&booking.slot_interval_minutes) {
        return Err(ConfigError::Validation(
            "booking.slot_interval_minutes must be in range 5..=240".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    let known = ["trace", "debug", "info", "warn", "error"];
    if !known.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level `{}` is not one of trace|debug|info|warn|error",
            logging.level
        )));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_slot_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::Validation(format!("{key} must be HH:MM, got `{value}`")))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        config.validate().expect("defaults must be valid");
        assert_eq!(config.booking.horizon_days, 3);
        assert_eq!(config.booking.reservation_prefix, "TT");
        assert_eq!(config.booking.slot_grid().len(), 25);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[booking]\nhorizon_days = 7\nfirst_slot = \"10:00\"\n\n[logging]\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load");

        assert_eq!(config.booking.horizon_days, 7);
        assert_eq!(config.booking.first_slot.format("%H:%M").to_string(), "10:00");
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched sections keep defaults
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("definitely/not/here.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            config_path: Some("definitely/not/here.toml".into()),
            require_file: false,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                horizon_days: Some(1),
                ..ConfigOverrides::default()
            },
        })
        .expect("load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.booking.horizon_days, 1);
    }

    #[test]
    fn bad_slot_bounds_fail_validation() {
        let mut config = AppConfig::default();
        std::mem::swap(&mut config.booking.first_slot, &mut config.booking.last_slot);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
