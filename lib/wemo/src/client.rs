use std::net::IpAddr;
use std::time::Duration;

use chipp_http::{HttpClient, HttpMethod, NoInterceptor};
use log::{debug, trace};

use crate::insight::InsightParams;
use crate::soap::{self, Action, BASIC_EVENT, INSIGHT};
use crate::Error;

pub const PORT: u16 = 49153;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Wemo {
    ip: IpAddr,
    http_client: HttpClient<NoInterceptor>,
    timeout: Duration,
}

impl Wemo {
    pub fn new(ip: IpAddr) -> Result<Self, Error> {
        Self::with_port(ip, PORT)
    }

    pub fn with_port(ip: IpAddr, port: u16) -> Result<Self, Error> {
        let base = match ip {
            IpAddr::V4(ip) => format!("http://{ip}:{port}"),
            IpAddr::V6(ip) => format!("http://[{ip}]:{port}"),
        };

        Ok(Self {
            ip,
            http_client: HttpClient::new(base.as_str())?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub async fn friendly_name(&self) -> Result<String, Error> {
        let body = self
            .perform(Action::new(BASIC_EVENT, "GetFriendlyName"))
            .await?;

        soap::extract_value(&body, "FriendlyName").ok_or(Error::MissingValue("FriendlyName"))
    }

    pub async fn insight_params(&self) -> Result<InsightParams, Error> {
        let body = self.perform(Action::new(INSIGHT, "GetInsightParams")).await?;

        soap::extract_value(&body, "InsightParams")
            .ok_or(Error::MissingValue("InsightParams"))?
            .parse()
    }

    /// Returns `false` when the switch answers with `Error` instead of a state.
    pub async fn set_binary_state(&self, on: bool) -> Result<bool, Error> {
        let action =
            Action::new(BASIC_EVENT, "SetBinaryState").with_argument("BinaryState", u8::from(on));
        let body = self.perform(action).await?;

        let state = soap::extract_value(&body, "BinaryState")
            .ok_or(Error::MissingValue("BinaryState"))?;
        debug!("{} SetBinaryState({}) -> {state}", self.ip, u8::from(on));

        Ok(accepted(&state))
    }

    async fn perform(&self, action: Action) -> Result<String, Error> {
        let mut request = self.http_client.new_request(action.service.control_path);
        request.set_method(HttpMethod::Post);
        request.add_header("Content-Type", "text/xml; charset=\"utf-8\"");
        request.add_header("SOAPACTION", action.header());
        request.body = Some(action.envelope().into_bytes());

        trace!("{} {} request", self.ip, action.name);

        let response = self.http_client.perform_request(request, |req, res| {
            if res.status_code == 200 {
                Ok(res.body)
            } else {
                Err((req, res).into())
            }
        });

        let body = match tokio::time::timeout(self.timeout, response).await {
            Ok(body) => body?,
            Err(_) => return Err(Error::Timeout(action.name)),
        };

        let body = String::from_utf8_lossy(&body).into_owned();
        trace!("{} {} response: {body}", self.ip, action.name);

        Ok(body)
    }
}

/// A rejected `SetBinaryState` echoes `Error` in place of the state.
fn accepted(state: &str) -> bool {
    !state.trim().eq_ignore_ascii_case("error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted() {
        assert!(accepted("1"));
        assert!(accepted("0"));
        assert!(accepted("1|1523017022|0|0|0|1209600|3|2450|0|0|8000"));
        assert!(!accepted("Error"));
        assert!(!accepted(" error "));
    }

    #[test]
    fn test_client_address() {
        let wemo = Wemo::new("192.168.1.60".parse().unwrap()).unwrap();
        assert_eq!(wemo.ip().to_string(), "192.168.1.60");
    }

    #[tokio::test]
    async fn test_unreachable_switch_times_out() {
        // TEST-NET-1, never routed
        let wemo = Wemo::new("192.0.2.1".parse().unwrap())
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        assert!(wemo.friendly_name().await.is_err());
    }
}
