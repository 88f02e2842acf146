use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use log::{debug, trace};
use serde::de::DeserializeOwned;

use crate::command::{Command, CountDownSetting, KeyType, RelayAction, TimeZoneSetting};
use crate::reply::{
    self, AccessPoints, ActionResult, AddedCountDownRule, CountDownRules, DeviceInfo,
    DeviceTime, DeviceTimeZone, Realtime,
};
use crate::transport::{self, Timeouts, PORT};
use crate::{Error, Result};

/// One HS1xx plug. Holds no connection, every call opens its own.
#[derive(Debug, Clone)]
pub struct Hs1xx {
    addr: SocketAddr,
    timeouts: Timeouts,
}

impl Hs1xx {
    pub fn new(ip: IpAddr) -> Self {
        Self::with_addr(SocketAddr::new(ip, PORT))
    }

    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn is_reachable(&self) -> bool {
        match transport::connect(self.addr, self.timeouts.connect).await {
            Ok(_) => true,
            Err(err) => {
                trace!("{err}");
                false
            }
        }
    }

    pub async fn device_info(&self) -> Result<DeviceInfo> {
        self.request(Command::GetSysInfo).await
    }

    pub async fn realtime(&self) -> Result<Realtime> {
        self.request(Command::GetRealtime).await
    }

    pub async fn set_relay_state(&self, on: bool) -> Result<ActionResult> {
        debug!("{} relay -> {}", self.addr, if on { "on" } else { "off" });
        self.request(Command::SetRelayState(RelayAction::from(on)))
            .await
    }

    pub async fn set_led(&self, on: bool) -> Result<ActionResult> {
        self.request(Command::SetLedOff(!on)).await
    }

    pub async fn set_alias(&self, alias: &str) -> Result<ActionResult> {
        self.request(Command::SetAlias(alias.to_string())).await
    }

    /// The plug drops the connection while rebooting, so no reply is read.
    pub async fn reboot(&self, delay: u32) -> Result<()> {
        self.notify(Command::Reboot { delay }).await
    }

    pub async fn reset(&self, delay: u32) -> Result<()> {
        self.notify(Command::Reset { delay }).await
    }

    pub async fn time(&self) -> Result<DeviceTime> {
        self.request(Command::GetTime).await
    }

    pub async fn timezone(&self) -> Result<DeviceTimeZone> {
        self.request(Command::GetTimeZone).await
    }

    pub async fn set_timezone(&self, setting: TimeZoneSetting) -> Result<ActionResult> {
        self.request(Command::SetTimeZone(setting)).await
    }

    pub async fn count_down_rules(&self) -> Result<CountDownRules> {
        self.request(Command::GetCountDownRules).await
    }

    pub async fn add_count_down_rule(
        &self,
        rule: CountDownSetting,
    ) -> Result<AddedCountDownRule> {
        self.request(Command::AddCountDownRule(rule)).await
    }

    pub async fn edit_count_down_rule(
        &self,
        id: &str,
        rule: CountDownSetting,
    ) -> Result<ActionResult> {
        let id = id.to_string();
        self.request(Command::EditCountDownRule { id, rule }).await
    }

    pub async fn delete_count_down_rule(&self, id: &str) -> Result<ActionResult> {
        let id = id.to_string();
        self.request(Command::DeleteCountDownRule { id }).await
    }

    pub async fn delete_all_count_down_rules(&self) -> Result<ActionResult> {
        self.request(Command::DeleteAllCountDownRules).await
    }

    pub async fn access_points(&self) -> Result<AccessPoints> {
        self.request(Command::ScanAccessPoints).await
    }

    pub async fn set_access_point(
        &self,
        ssid: &str,
        password: &str,
        key_type: KeyType,
    ) -> Result<ActionResult> {
        self.request(Command::SetAccessPoint {
            ssid: ssid.to_string(),
            password: password.to_string(),
            key_type,
        })
        .await
    }

    async fn request<T>(&self, command: Command) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let payload = transport::send_and_receive(self.addr, &command, &self.timeouts).await?;

        reply::parse(command.module(), command.method(), &payload)
            .map_err(|cause| Error::incompatible(&command, cause))
    }

    async fn notify(&self, command: Command) -> Result<()> {
        transport::send_command(self.addr, &command, &self.timeouts).await
    }
}

/// Whether something accepts TCP connections on the plug port within `limit`.
pub async fn is_reachable(ip: IpAddr, limit: Duration) -> bool {
    let timeouts = Timeouts {
        connect: limit,
        ..Timeouts::default()
    };

    Hs1xx::new(ip).with_timeouts(timeouts).is_reachable().await
}
