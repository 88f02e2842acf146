use std::str::FromStr;
use std::time::Duration;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryState {
    Off,
    On,
    /// Relay closed but the load draws less than the standby threshold.
    Standby,
    Unknown(i32),
}

impl BinaryState {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::On,
            8 => Self::Standby,
            other => Self::Unknown(other),
        }
    }

    /// `None` when the device reported something we can't map.
    pub fn is_on(self) -> Option<bool> {
        match self {
            Self::Off => Some(false),
            Self::On | Self::Standby => Some(true),
            Self::Unknown(_) => None,
        }
    }
}

/// Decoded `GetInsightParams` reply, eleven `|`-separated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightParams {
    pub state: BinaryState,
    /// Unix seconds.
    pub last_change: i64,
    pub on_for: Duration,
    pub on_today: Duration,
    pub on_total: Duration,
    pub averaging_period: Duration,
    pub average_power_watts: u32,
    pub current_power_watts: f64,
    pub energy_today_wmin: f64,
    pub energy_total_wmin: f64,
    pub threshold_mw: u32,
}

impl FromStr for InsightParams {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInsightParams(raw.to_string());

        let fields: Vec<&str> = raw.trim().split('|').collect();
        if fields.len() < 11 {
            return Err(invalid());
        }

        fn field<T: FromStr>(value: &str) -> Option<T> {
            value.trim().parse().ok()
        }

        let seconds = |value: &str| field::<u64>(value).map(Duration::from_secs);

        Ok(Self {
            state: BinaryState::from_raw(field(fields[0]).ok_or_else(invalid)?),
            last_change: field(fields[1]).ok_or_else(invalid)?,
            on_for: seconds(fields[2]).ok_or_else(invalid)?,
            on_today: seconds(fields[3]).ok_or_else(invalid)?,
            on_total: seconds(fields[4]).ok_or_else(invalid)?,
            averaging_period: seconds(fields[5]).ok_or_else(invalid)?,
            average_power_watts: field(fields[6]).ok_or_else(invalid)?,
            current_power_watts: field::<f64>(fields[7]).ok_or_else(invalid)? / 1000.0,
            energy_today_wmin: field::<f64>(fields[8]).ok_or_else(invalid)? / 1000.0,
            energy_total_wmin: field::<f64>(fields[9]).ok_or_else(invalid)? / 1000.0,
            threshold_mw: field(fields[10]).ok_or_else(invalid)?,
        })
    }
}
