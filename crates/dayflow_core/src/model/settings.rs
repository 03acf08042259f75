//! Application settings record.
//!
//! # Invariants
//! - Exactly one settings record exists per installation.
//! - Missing fields in persisted JSON fall back to per-field defaults.
//! - Alert times are always valid 24-hour `HH:MM` values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static ALERT_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid alert time regex"));

pub const DEFAULT_MORNING_ALERT: &str = "09:00";
pub const DEFAULT_EVENING_ALERT: &str = "20:00";
pub const DEFAULT_USER_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    InvalidAlertTime(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAlertTime(value) => {
                write!(f, "invalid alert time `{value}`; expected HH:MM")
            }
        }
    }
}

impl Error for SettingsError {}

/// Local wall-clock time of a daily reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlertTime {
    hour: u8,
    minute: u8,
}

impl AlertTime {
    pub fn parse(value: &str) -> Result<Self, SettingsError> {
        let trimmed = value.trim();
        let invalid = || SettingsError::InvalidAlertTime(trimmed.to_string());
        let caps = ALERT_TIME_RE.captures(trimmed).ok_or_else(invalid)?;
        let hour = caps[1].parse::<u8>().map_err(|_| invalid())?;
        let minute = caps[2].parse::<u8>().map_err(|_| invalid())?;
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    fn from_const(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }
}

impl Display for AlertTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for AlertTime {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AlertTime> for String {
    fn from(value: AlertTime) -> Self {
        value.to_string()
    }
}

/// Per-installation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub morning_alert_time: AlertTime,
    pub evening_alert_time: AlertTime,
    pub notifications_enabled: bool,
    /// Name used when addressing the user in briefing prompts.
    pub user_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            morning_alert_time: AlertTime::from_const(9, 0),
            evening_alert_time: AlertTime::from_const(20, 0),
            notifications_enabled: true,
            user_name: DEFAULT_USER_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertTime, AppSettings, DEFAULT_EVENING_ALERT, DEFAULT_MORNING_ALERT};

    #[test]
    fn defaults_match_documented_values() {
        let settings = AppSettings::default();
        assert_eq!(settings.morning_alert_time.to_string(), DEFAULT_MORNING_ALERT);
        assert_eq!(settings.evening_alert_time.to_string(), DEFAULT_EVENING_ALERT);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn alert_time_rejects_out_of_range_values() {
        assert!(AlertTime::parse("24:00").is_err());
        assert!(AlertTime::parse("9:00").is_err());
        assert!(AlertTime::parse("07:60").is_err());
        let parsed = AlertTime::parse("07:45").unwrap();
        assert_eq!((parsed.hour(), parsed.minute()), (7, 45));
    }

    #[test]
    fn partial_json_fills_missing_fields_with_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"morningAlertTime":"06:30","userName":"Mina"}"#).unwrap();
        assert_eq!(settings.morning_alert_time.to_string(), "06:30");
        assert_eq!(settings.evening_alert_time.to_string(), "20:00");
        assert!(settings.notifications_enabled);
        assert_eq!(settings.user_name, "Mina");
    }
}
