use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use hs1xx::{Hs1xx, Reply};
use log::{debug, warn};
use wemo::Wemo;

use crate::error::PlugError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    WemoInsight,
    Hs110,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugState {
    On,
    Off,
    Unknown,
}

/// Attached to every error and event so the reader knows which plug it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlugIdentity {
    pub vendor: Vendor,
    pub ip: IpAddr,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmartPlug: Send + Sync {
    fn identity(&self) -> PlugIdentity;

    async fn name(&self) -> Result<String, PlugError>;
    async fn state(&self) -> Result<PlugState, PlugError>;
    /// `0.0` when the plug answered but reported no reading.
    async fn power_watts(&self) -> Result<f64, PlugError>;
    /// `false` when the plug refused the change.
    async fn set_state(&self, on: bool) -> Result<bool, PlugError>;
}

pub fn connect(vendor: Vendor, ip: IpAddr) -> Result<Box<dyn SmartPlug>, PlugError> {
    let identity = PlugIdentity { vendor, ip };

    match vendor {
        Vendor::Hs110 => Ok(Box::new(TplinkPlug {
            identity,
            client: Hs1xx::new(ip),
        })),
        Vendor::WemoInsight => {
            let client = Wemo::new(ip).map_err(|err| PlugError::new(identity, "connect", err))?;
            Ok(Box::new(WemoPlug { identity, client }))
        }
    }
}

pub struct TplinkPlug {
    identity: PlugIdentity,
    client: Hs1xx,
}

#[async_trait]
impl SmartPlug for TplinkPlug {
    fn identity(&self) -> PlugIdentity {
        self.identity
    }

    async fn name(&self) -> Result<String, PlugError> {
        let info = self
            .client
            .device_info()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetName", err))?;

        Ok(info.alias)
    }

    async fn state(&self) -> Result<PlugState, PlugError> {
        let info = self
            .client
            .device_info()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetState", err))?;

        Ok(match info.relay_on() {
            Some(true) => PlugState::On,
            Some(false) => PlugState::Off,
            None => PlugState::Unknown,
        })
    }

    async fn power_watts(&self) -> Result<f64, PlugError> {
        let realtime = self
            .client
            .realtime()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetPowerWatts", err))?;

        match realtime.power_watts() {
            Some(watts) => Ok(watts),
            None => {
                debug!(
                    "{} reported no power reading: {:?}",
                    self.identity,
                    realtime.err_msg()
                );
                Ok(0.0)
            }
        }
    }

    async fn set_state(&self, on: bool) -> Result<bool, PlugError> {
        let result = self
            .client
            .set_relay_state(on)
            .await
            .map_err(|err| PlugError::new(self.identity, "SetState", err))?;

        if !result.is_success() {
            warn!(
                "{} rejected relay change: {}",
                self.identity,
                result.err_msg().unwrap_or("no reason given")
            );
        }

        Ok(result.is_success())
    }
}

pub struct WemoPlug {
    identity: PlugIdentity,
    client: Wemo,
}

#[async_trait]
impl SmartPlug for WemoPlug {
    fn identity(&self) -> PlugIdentity {
        self.identity
    }

    async fn name(&self) -> Result<String, PlugError> {
        self.client
            .friendly_name()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetName", err))
    }

    async fn state(&self) -> Result<PlugState, PlugError> {
        let params = self
            .client
            .insight_params()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetState", err))?;

        Ok(match params.state.is_on() {
            Some(true) => PlugState::On,
            Some(false) => PlugState::Off,
            None => PlugState::Unknown,
        })
    }

    async fn power_watts(&self) -> Result<f64, PlugError> {
        let params = self
            .client
            .insight_params()
            .await
            .map_err(|err| PlugError::new(self.identity, "GetPowerWatts", err))?;

        Ok(params.current_power_watts)
    }

    async fn set_state(&self, on: bool) -> Result<bool, PlugError> {
        self.client
            .set_binary_state(on)
            .await
            .map_err(|err| PlugError::new(self.identity, "SetState", err))
    }
}

impl FromStr for Vendor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "wemo" | "wemo-insight" => Ok(Self::WemoInsight),
            "1" | "hs110" | "hs1xx" | "tplink" | "tp-link" => Ok(Self::Hs110),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WemoInsight => write!(f, "Belkin WeMo Insight Switch"),
            Self::Hs110 => write!(f, "TP-Link HS110"),
        }
    }
}

impl fmt::Display for PlugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for PlugIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.vendor, self.ip)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use hs1xx::Framing;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves one reply per connection, in order.
    async fn fake_hs110(replies: Vec<&'static str>) -> TplinkPlug {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut request = [0; 1024];
                let _ = socket.read(&mut request).await.unwrap();

                let frame = hs1xx::encode(reply.as_bytes(), Framing::Stream);
                socket.write_all(&frame).await.unwrap();
            }
        });

        TplinkPlug {
            identity: PlugIdentity {
                vendor: Vendor::Hs110,
                ip: addr.ip(),
            },
            client: Hs1xx::with_addr(addr),
        }
    }

    #[tokio::test]
    async fn test_tplink_relay_state_mapping() {
        let plug = fake_hs110(vec![
            r#"{"system":{"get_sysinfo":{"err_code":0,"relay_state":1}}}"#,
            r#"{"system":{"get_sysinfo":{"err_code":0,"relay_state":0}}}"#,
            r#"{"system":{"get_sysinfo":{"err_code":0,"relay_state":"?"}}}"#,
            r#"{"system":{"get_sysinfo":{"err_code":-3,"err_msg":"busy"}}}"#,
        ])
        .await;

        assert_eq!(plug.state().await.unwrap(), PlugState::On);
        assert_eq!(plug.state().await.unwrap(), PlugState::Off);
        assert_eq!(plug.state().await.unwrap(), PlugState::Unknown);
        assert_eq!(plug.state().await.unwrap(), PlugState::Unknown);
    }

    #[tokio::test]
    async fn test_tplink_power_falls_back_to_zero() {
        let plug = fake_hs110(vec![
            r#"{"emeter":{"get_realtime":{"err_code":0,"power":702.5}}}"#,
            r#"{"emeter":{"get_realtime":{"err_code":-1,"err_msg":"module not support"}}}"#,
        ])
        .await;

        assert_eq!(plug.power_watts().await.unwrap(), 702.5);
        assert_eq!(plug.power_watts().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_tplink_set_state_reports_rejection() {
        let plug = fake_hs110(vec![
            r#"{"system":{"set_relay_state":{"err_code":0}}}"#,
            r#"{"system":{"set_relay_state":{"err_code":-1,"err_msg":"busy"}}}"#,
        ])
        .await;

        assert!(plug.set_state(false).await.unwrap());
        assert!(!plug.set_state(true).await.unwrap());
    }

    #[tokio::test]
    async fn test_tplink_garbage_is_communication_error() {
        let plug = fake_hs110(vec!["not json"]).await;

        let err = plug.name().await.unwrap_err();

        assert_eq!(err.operation, "GetName");
        assert!(matches!(err.cause, crate::error::PlugFailure::Hs1xx(_)));
    }

    #[test]
    fn test_vendor_tags() {
        assert_eq!("0".parse::<Vendor>(), Ok(Vendor::WemoInsight));
        assert_eq!("WeMo".parse::<Vendor>(), Ok(Vendor::WemoInsight));
        assert_eq!("1".parse::<Vendor>(), Ok(Vendor::Hs110));
        assert_eq!("hs110".parse::<Vendor>(), Ok(Vendor::Hs110));
        assert_eq!("2".parse::<Vendor>(), Err(()));
        assert_eq!("kasa".parse::<Vendor>(), Err(()));
    }

    #[test]
    fn test_connect_selects_variant() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 118));

        let plug = connect(Vendor::Hs110, ip).unwrap();
        assert_eq!(plug.identity(), PlugIdentity { vendor: Vendor::Hs110, ip });

        let plug = connect(Vendor::WemoInsight, ip).unwrap();
        assert_eq!(plug.identity().vendor, Vendor::WemoInsight);
    }

    #[tokio::test]
    async fn test_unreachable_plug_error_carries_identity() {
        // port 9999 on localhost is not expected to be open
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let plug = connect(Vendor::Hs110, ip).unwrap();

        let err = plug.state().await.unwrap_err();

        assert_eq!(err.plug, PlugIdentity { vendor: Vendor::Hs110, ip });
        assert_eq!(err.operation, "GetState");
        assert!(err.to_string().contains("127.0.0.1"));
    }
}
