use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::command::KeyType;
use crate::error::Incompatible;

/// Every response section carries `err_code`; `0` means the remaining fields
/// are populated, anything else leaves them at their defaults.
pub trait Reply {
    fn err_code(&self) -> i32;
    fn err_msg(&self) -> Option<&str>;

    fn is_success(&self) -> bool {
        self.err_code() == 0
    }
}

macro_rules! impl_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reply for $ty {
                fn err_code(&self) -> i32 {
                    self.err_code
                }

                fn err_msg(&self) -> Option<&str> {
                    self.err_msg.as_deref()
                }
            }
        )*
    };
}

impl_reply!(
    ActionResult,
    DeviceInfo,
    Realtime,
    DeviceTime,
    DeviceTimeZone,
    CountDownRules,
    AddedCountDownRule,
    AccessPoints,
);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionResult {
    pub err_code: i32,
    #[serde(default)]
    pub err_msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub alias: String,
    pub dev_name: String,
    pub model: String,
    #[serde(alias = "mic_type")]
    pub r#type: String,
    pub mac: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "hwId")]
    pub hw_id: String,
    #[serde(rename = "fwId")]
    pub fw_id: String,
    #[serde(rename = "oemId")]
    pub oem_id: String,
    pub sw_ver: String,
    pub hw_ver: String,
    #[serde(deserialize_with = "lenient_u8")]
    pub relay_state: Option<u8>,
    #[serde(deserialize_with = "lenient_u8")]
    pub led_off: Option<u8>,
    pub on_time: i64,
    pub rssi: i64,
    pub updating: i64,
    pub active_mode: String,
    pub feature: String,
}

impl DeviceInfo {
    /// `None` when the plug did not report a usable relay position.
    pub fn relay_on(&self) -> Option<bool> {
        if !self.is_success() {
            return None;
        }

        self.relay_state.map(|state| state != 0)
    }
}

/// HS110 hardware v1 reports SI units, v2 reports milli-units.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Realtime {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    current: Option<f64>,
    current_ma: Option<f64>,
    voltage: Option<f64>,
    voltage_mv: Option<f64>,
    power: Option<f64>,
    power_mw: Option<f64>,
    total: Option<f64>,
    total_wh: Option<f64>,
}

impl Realtime {
    pub fn power_watts(&self) -> Option<f64> {
        self.pick(self.power, self.power_mw)
    }

    pub fn current_amps(&self) -> Option<f64> {
        self.pick(self.current, self.current_ma)
    }

    pub fn voltage_volts(&self) -> Option<f64> {
        self.pick(self.voltage, self.voltage_mv)
    }

    pub fn total_kwh(&self) -> Option<f64> {
        self.pick(self.total, self.total_wh)
    }

    fn pick(&self, si: Option<f64>, milli: Option<f64>) -> Option<f64> {
        if !self.is_success() {
            return None;
        }

        si.or(milli.map(|value| value / 1000.0))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DeviceTime {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub year: u16,
    pub month: u8,
    pub mday: u8,
    pub wday: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DeviceTimeZone {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub index: u8,
    pub zone_str: String,
    pub tz_str: String,
    pub dst_offset: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CountDownRules {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub rule_list: Vec<CountDownRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountDownRule {
    pub id: String,
    pub name: String,
    pub enable: u8,
    pub delay: u32,
    pub act: u8,
    #[serde(default)]
    pub remain: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AddedCountDownRule {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AccessPoints {
    #[serde(default = "missing_err_code")]
    pub err_code: i32,
    pub err_msg: Option<String>,
    pub ap_list: Vec<AccessPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessPoint {
    pub ssid: String,
    pub key_type: KeyType,
}

/// Pulls `{module: {method: ...}}` out of a decoded response and deserializes
/// the inner section. A section without `err_code` is rejected.
pub(crate) fn parse<T>(
    module: &'static str,
    method: &'static str,
    body: &[u8],
) -> Result<T, Incompatible>
where
    T: DeserializeOwned,
{
    let mut response: Value = serde_json::from_slice(body)?;

    let section = response
        .get_mut(module)
        .and_then(|module| module.get_mut(method))
        .map(Value::take)
        .ok_or(Incompatible::MissingSection { module, method })?;

    if section.get("err_code").and_then(Value::as_i64).is_none() {
        return Err(Incompatible::MissingSection {
            module,
            method: "err_code",
        });
    }

    Ok(serde_json::from_value(section)?)
}

fn missing_err_code() -> i32 {
    -1
}

fn lenient_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|value| u8::try_from(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSINFO: &str = r#"{"system":{"get_sysinfo":{
        "err_code":0,"sw_ver":"1.2.5 Build 171213 Rel.101523","hw_ver":"1.0",
        "type":"IOT.SMARTPLUGSWITCH","model":"HS110(EU)","mac":"50:C7:BF:00:11:22",
        "deviceId":"8006ABCDEF","hwId":"45E29DA8","fwId":"00000000","oemId":"3D341ECE",
        "alias":"Rig 3","dev_name":"Wi-Fi Smart Plug With Energy Monitoring",
        "icon_hash":"","relay_state":1,"on_time":1234,"active_mode":"schedule",
        "feature":"TIM:ENE","updating":0,"rssi":-57,"led_off":0,"latitude":0,"longitude":0
    }}}"#;

    #[test]
    fn test_parse_sysinfo() {
        let info: DeviceInfo = parse("system", "get_sysinfo", SYSINFO.as_bytes()).unwrap();

        assert!(info.is_success());
        assert_eq!(info.alias, "Rig 3");
        assert_eq!(info.model, "HS110(EU)");
        assert_eq!(info.r#type, "IOT.SMARTPLUGSWITCH");
        assert_eq!(info.device_id, "8006ABCDEF");
        assert_eq!(info.relay_state, Some(1));
        assert_eq!(info.relay_on(), Some(true));
        assert_eq!(info.rssi, -57);
    }

    #[test]
    fn test_relay_state_mapping() {
        let relay = |raw: &str| {
            let body = format!(r#"{{"system":{{"get_sysinfo":{{"err_code":0,"relay_state":{raw}}}}}}}"#);
            parse::<DeviceInfo>("system", "get_sysinfo", body.as_bytes())
                .unwrap()
                .relay_on()
        };

        assert_eq!(relay("0"), Some(false));
        assert_eq!(relay("1"), Some(true));
        assert_eq!(relay("7"), Some(true));
        assert_eq!(relay("\"on\""), None);
        assert_eq!(relay("null"), None);
        assert_eq!(relay("-1"), None);
    }

    #[test]
    fn test_device_error_leaves_defaults() {
        let body = br#"{"system":{"get_sysinfo":{"err_code":-1,"err_msg":"module not support","relay_state":1}}}"#;
        let info: DeviceInfo = parse("system", "get_sysinfo", body).unwrap();

        assert!(!info.is_success());
        assert_eq!(info.err_msg(), Some("module not support"));
        assert_eq!(info.relay_on(), None);
    }

    #[test]
    fn test_missing_err_code_is_incompatible() {
        let body = br#"{"system":{"get_sysinfo":{"alias":"Rig 3","relay_state":1}}}"#;
        let err = parse::<DeviceInfo>("system", "get_sysinfo", body).unwrap_err();

        assert!(matches!(
            err,
            Incompatible::MissingSection {
                method: "err_code",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_section_is_incompatible() {
        let body = br#"{"emeter":{"err_code":-1,"err_msg":"module not support"}}"#;
        let err = parse::<Realtime>("emeter", "get_realtime", body).unwrap_err();

        assert!(matches!(err, Incompatible::MissingSection { .. }));
    }

    #[test]
    fn test_invalid_json_is_incompatible() {
        let err = parse::<DeviceInfo>("system", "get_sysinfo", b"{\"system\":").unwrap_err();

        assert!(matches!(err, Incompatible::Json(_)));
    }

    #[test]
    fn test_realtime_units() {
        let v1 = br#"{"emeter":{"get_realtime":{"current":2.95,"voltage":231.4,"power":682.3,"total":31.2,"err_code":0}}}"#;
        let v2 = br#"{"emeter":{"get_realtime":{"current_ma":2950,"voltage_mv":231400,"power_mw":682300,"total_wh":31200,"err_code":0}}}"#;

        for body in [&v1[..], &v2[..]] {
            let realtime: Realtime = parse("emeter", "get_realtime", body).unwrap();

            assert_eq!(realtime.power_watts(), Some(682.3));
            assert_eq!(realtime.current_amps(), Some(2.95));
            assert_eq!(realtime.voltage_volts(), Some(231.4));
            assert_eq!(realtime.total_kwh(), Some(31.2));
        }
    }

    #[test]
    fn test_realtime_failure_has_no_power() {
        let body = br#"{"emeter":{"get_realtime":{"err_code":-2,"err_msg":"member not support","power":5}}}"#;
        let realtime: Realtime = parse("emeter", "get_realtime", body).unwrap();

        assert_eq!(realtime.power_watts(), None);
    }

    #[test]
    fn test_count_down_rules() {
        let body = br#"{"count_down":{"get_rules":{"rule_list":[
            {"id":"7C90311A","name":"rig","enable":1,"delay":1800,"act":1,"remain":1799},
            {"id":"7C90311B","name":"off","enable":0,"delay":60,"act":0}
        ],"err_code":0}}}"#;
        let rules: CountDownRules = parse("count_down", "get_rules", body).unwrap();

        assert_eq!(rules.rule_list.len(), 2);
        assert_eq!(rules.rule_list[0].remain, 1799);
        assert_eq!(rules.rule_list[1].remain, 0);
    }

    #[test]
    fn test_access_points() {
        let body = br#"{"netif":{"get_scaninfo":{"ap_list":[
            {"ssid":"home","key_type":3},{"ssid":"guest","key_type":0}
        ],"err_code":0}}}"#;
        let aps: AccessPoints = parse("netif", "get_scaninfo", body).unwrap();

        assert_eq!(aps.ap_list[0].key_type, KeyType::Wpa2);
        assert_eq!(aps.ap_list[1].key_type, KeyType::Open);
    }
}
