use std::time::Duration;

use chrono::{DateTime, Local};

use crate::plug::PlugIdentity;

/// One completed off/on cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCycleEvent {
    pub plug: PlugIdentity,
    pub plug_name: String,
    pub trigger_watts: f64,
    pub threshold_watts: f64,
    pub below_for: Duration,
    pub powered_off: DateTime<Local>,
    pub powered_on: DateTime<Local>,
}

impl PowerCycleEvent {
    pub fn summary(&self) -> String {
        format!(
            "{} was powered off at {} due to power consumption being lower than {} W for {} seconds. \
             Power consumption at the time of powering off was {} W. \
             The plug was powered back on at {}.",
            self.plug_name,
            self.powered_off.format("%H:%M"),
            self.threshold_watts,
            self.below_for.as_secs(),
            self.trigger_watts,
            self.powered_on.format("%H:%M"),
        )
    }
}
