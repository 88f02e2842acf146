use std::time::Duration;

use async_trait::async_trait;
use chipp_http::{HttpClient, HttpMethod, NoInterceptor};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

const TEXTBELT_URL: &str = "https://textbelt.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns how many messages the account may still send.
    async fn send_text(&self, message: &str) -> Result<u32, NotifyError>;
}

pub struct Textbelt {
    key: String,
    phone: String,
    http_client: HttpClient<NoInterceptor>,
    timeout: Duration,
}

#[derive(Serialize)]
struct Form<'a> {
    phone: &'a str,
    message: &'a str,
    key: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Outcome {
    success: bool,
    #[serde(default)]
    quota_remaining: u32,
    #[serde(default)]
    text_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl Textbelt {
    pub fn new(key: String, phone: String) -> Result<Self, NotifyError> {
        Self::with_base_url(TEXTBELT_URL, key, phone)
    }

    pub fn with_base_url(base_url: &str, key: String, phone: String) -> Result<Self, NotifyError> {
        Ok(Self {
            key,
            phone,
            http_client: HttpClient::new(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Notifier for Textbelt {
    async fn send_text(&self, message: &str) -> Result<u32, NotifyError> {
        let form = Form {
            phone: &self.phone,
            message,
            key: &self.key,
        };

        let mut request = self.http_client.new_request(["text"]);
        request.set_method(HttpMethod::Post);
        request.add_header("Content-Type", "application/x-www-form-urlencoded");
        request.body = Some(serde_urlencoded::to_string(&form)?.into_bytes());

        let response = self
            .http_client
            .perform_request(request, |_, res| Ok(res.body));

        let body = match tokio::time::timeout(self.timeout, response).await {
            Ok(body) => body?,
            Err(_) => return Err(NotifyError::Timeout),
        };
        trace!("textbelt response: {}", String::from_utf8_lossy(&body));

        parse_outcome(&body)
    }
}

fn parse_outcome(body: &[u8]) -> Result<u32, NotifyError> {
    let outcome: Outcome = serde_json::from_slice(body)?;

    if !outcome.success {
        let reason = outcome.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(NotifyError::Rejected(reason));
    }

    debug!("text {:?} accepted", outcome.text_id);
    Ok(outcome.quota_remaining)
}

/// Textbelt wants the number in international format.
pub fn normalize_phone(number: &str) -> String {
    let number = number.trim();

    if number.starts_with('+') {
        number.to_string()
    } else {
        format!("+{number}")
    }
}
