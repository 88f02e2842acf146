use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Longest count down the plug accepts, 23:59:59.
pub const MAX_COUNT_DOWN_DELAY: u32 = 86399;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetSysInfo,
    SetRelayState(RelayAction),
    SetLedOff(bool),
    SetAlias(String),
    Reboot { delay: u32 },
    Reset { delay: u32 },

    GetRealtime,

    GetTime,
    GetTimeZone,
    SetTimeZone(TimeZoneSetting),

    GetCountDownRules,
    AddCountDownRule(CountDownSetting),
    EditCountDownRule { id: String, rule: CountDownSetting },
    DeleteCountDownRule { id: String },
    DeleteAllCountDownRules,

    ScanAccessPoints,
    SetAccessPoint {
        ssid: String,
        password: String,
        key_type: KeyType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RelayAction {
    TurnOff = 0,
    TurnOn = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum KeyType {
    Open = 0,
    Wep = 1,
    Wpa = 2,
    Wpa2 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneSetting {
    pub year: u16,
    pub month: u8,
    pub mday: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    pub index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountDownSetting {
    pub name: String,
    pub enable: bool,
    pub action: RelayAction,
    pub delay: u32,
}

impl Command {
    pub fn module(&self) -> &'static str {
        match self {
            Command::GetSysInfo
            | Command::SetRelayState(_)
            | Command::SetLedOff(_)
            | Command::SetAlias(_)
            | Command::Reboot { .. }
            | Command::Reset { .. } => "system",
            Command::GetRealtime => "emeter",
            Command::GetTime | Command::GetTimeZone | Command::SetTimeZone(_) => "time",
            Command::GetCountDownRules
            | Command::AddCountDownRule(_)
            | Command::EditCountDownRule { .. }
            | Command::DeleteCountDownRule { .. }
            | Command::DeleteAllCountDownRules => "count_down",
            Command::ScanAccessPoints | Command::SetAccessPoint { .. } => "netif",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Command::GetSysInfo => "get_sysinfo",
            Command::SetRelayState(_) => "set_relay_state",
            Command::SetLedOff(_) => "set_led_off",
            Command::SetAlias(_) => "set_dev_alias",
            Command::Reboot { .. } => "reboot",
            Command::Reset { .. } => "reset",
            Command::GetRealtime => "get_realtime",
            Command::GetTime => "get_time",
            Command::GetTimeZone => "get_timezone",
            Command::SetTimeZone(_) => "set_timezone",
            Command::GetCountDownRules => "get_rules",
            Command::AddCountDownRule(_) => "add_rule",
            Command::EditCountDownRule { .. } => "edit_rule",
            Command::DeleteCountDownRule { .. } => "delete_rule",
            Command::DeleteAllCountDownRules => "delete_all_rules",
            Command::ScanAccessPoints => "get_scaninfo",
            Command::SetAccessPoint { .. } => "set_stainfo",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Command::GetSysInfo
            | Command::GetTime
            | Command::GetTimeZone
            | Command::GetCountDownRules
            | Command::DeleteAllCountDownRules => Value::Null,
            Command::GetRealtime => json!({}),
            Command::SetRelayState(action) => json!({ "state": *action as u8 }),
            Command::SetLedOff(off) => json!({ "off": u8::from(*off) }),
            Command::SetAlias(alias) => json!({ "alias": sanitize_alias(alias) }),
            Command::Reboot { delay } | Command::Reset { delay } => json!({ "delay": delay }),
            Command::SetTimeZone(tz) => json!({
                "year": tz.year,
                "month": tz.month,
                "mday": tz.mday,
                "hour": tz.hour,
                "min": tz.min,
                "sec": tz.sec,
                "index": tz.index,
            }),
            Command::AddCountDownRule(rule) => rule.params(),
            Command::EditCountDownRule { id, rule } => {
                let mut params = rule.params();
                params["id"] = json!(id);
                params
            }
            Command::DeleteCountDownRule { id } => json!({ "id": id }),
            Command::ScanAccessPoints => json!({ "refresh": 1 }),
            Command::SetAccessPoint {
                ssid,
                password,
                key_type,
            } => json!({
                "ssid": ssid,
                "password": password,
                "key_type": *key_type as u8,
            }),
        }
    }
}

impl CountDownSetting {
    fn params(&self) -> Value {
        json!({
            "enable": u8::from(self.enable),
            "delay": self.delay.min(MAX_COUNT_DOWN_DELAY),
            "act": self.action as u8,
            "name": self.name,
        })
    }
}

impl From<bool> for RelayAction {
    fn from(on: bool) -> Self {
        if on {
            RelayAction::TurnOn
        } else {
            RelayAction::TurnOff
        }
    }
}

/// The plug only stores `A-Z a-z 0-9 @ ' . - _` and spaces in its alias.
pub fn sanitize_alias(alias: &str) -> String {
    alias
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "@'.-_".contains(*c) || c.is_whitespace())
        .collect()
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut method = Map::new();
        method.insert(self.method().to_string(), self.params());

        let mut envelope = serializer.serialize_map(Some(1))?;
        envelope.serialize_entry(self.module(), &method)?;
        envelope.end()
    }
}
