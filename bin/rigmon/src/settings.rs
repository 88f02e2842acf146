use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::journal::LoggingLevel;
use crate::notifier::normalize_phone;
use crate::plug::Vendor;

pub const DEFAULT_WAIT_AFTER_DECLINE: Duration = Duration::from_secs(300);
pub const DEFAULT_WAIT_BEFORE_POWER_ON: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub ip: IpAddr,
    pub vendor: Vendor,
    pub threshold_watts: f64,
    pub wait_after_decline: Duration,
    pub wait_before_power_on: Duration,
    pub logging_level: LoggingLevel,
    pub textbelt: Option<TextbeltSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextbeltSettings {
    pub key: String,
    pub phone: String,
}

impl MonitorSettings {
    pub fn new(ip: IpAddr, vendor: Vendor, threshold_watts: f64) -> Self {
        Self {
            ip,
            vendor,
            threshold_watts,
            wait_after_decline: DEFAULT_WAIT_AFTER_DECLINE,
            wait_before_power_on: DEFAULT_WAIT_BEFORE_POWER_ON,
            logging_level: LoggingLevel::default(),
            textbelt: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |name| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name| get(name).ok_or(ConfigError::Missing(name));

        let ip = parse(
            "RIGMON_PLUG_IP",
            &require("RIGMON_PLUG_IP")?,
            "an IP address",
        )?;
        let vendor = parse(
            "RIGMON_PLUG_TYPE",
            &require("RIGMON_PLUG_TYPE")?,
            "wemo (0) or hs110 (1)",
        )?;

        let threshold = require("RIGMON_THRESHOLD_WATTS")?;
        let threshold_watts: f64 = parse(
            "RIGMON_THRESHOLD_WATTS",
            &threshold,
            "a positive number of watts",
        )?;
        if !(threshold_watts.is_finite() && threshold_watts > 0.0) {
            return Err(ConfigError::Invalid {
                name: "RIGMON_THRESHOLD_WATTS",
                value: threshold,
                expected: "a positive number of watts",
            });
        }

        let mut settings = Self::new(ip, vendor, threshold_watts);

        if let Some(value) = get("RIGMON_WAIT_AFTER_DECLINE") {
            let seconds = parse("RIGMON_WAIT_AFTER_DECLINE", &value, "seconds")?;
            settings.wait_after_decline = Duration::from_secs(seconds);
        }

        if let Some(value) = get("RIGMON_WAIT_BEFORE_POWER_ON") {
            let seconds = parse("RIGMON_WAIT_BEFORE_POWER_ON", &value, "seconds")?;
            settings.wait_before_power_on = Duration::from_secs(seconds);
        }

        if let Some(value) = get("RIGMON_LOGGING_LEVEL") {
            settings.logging_level = parse("RIGMON_LOGGING_LEVEL", &value, "0, 1 or 2")?;
        }

        settings.textbelt = match (get("TEXTBELT_KEY"), get("TEXTBELT_NUMBER")) {
            (Some(key), Some(number)) => Some(TextbeltSettings {
                key,
                phone: normalize_phone(&number),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTextbelt),
        };

        Ok(settings)
    }
}

fn parse<T: FromStr>(
    name: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
        expected,
    })
}
