use std::fmt;

use crate::plug::PlugIdentity;

/// Ends monitoring. Anything recoverable is logged inside the loop instead.
#[derive(Debug)]
pub enum Error {
    Plug(PlugError),
    Rejected { plug: PlugIdentity, on: bool },
}

/// Any failure talking to a plug, whichever vendor it is.
#[derive(Debug)]
pub struct PlugError {
    pub plug: PlugIdentity,
    pub operation: &'static str,
    pub cause: PlugFailure,
}

#[derive(Debug)]
pub enum PlugFailure {
    Hs1xx(hs1xx::Error),
    Wemo(wemo::Error),
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    IncompleteTextbelt,
}

#[derive(Debug)]
pub enum NotifyError {
    UrlParse(chipp_http::UrlParseError),
    Http(chipp_http::Error),
    Json(serde_json::Error),
    Form(serde_urlencoded::ser::Error),
    Rejected(String),
    Timeout,
}

impl PlugError {
    pub fn new(plug: PlugIdentity, operation: &'static str, cause: impl Into<PlugFailure>) -> Self {
        Self {
            plug,
            operation,
            cause: cause.into(),
        }
    }
}

impl From<PlugError> for Error {
    fn from(err: PlugError) -> Self {
        Self::Plug(err)
    }
}

impl From<hs1xx::Error> for PlugFailure {
    fn from(err: hs1xx::Error) -> Self {
        Self::Hs1xx(err)
    }
}

impl From<wemo::Error> for PlugFailure {
    fn from(err: wemo::Error) -> Self {
        Self::Wemo(err)
    }
}

impl From<chipp_http::UrlParseError> for NotifyError {
    fn from(err: chipp_http::UrlParseError) -> Self {
        Self::UrlParse(err)
    }
}

impl From<chipp_http::Error> for NotifyError {
    fn from(err: chipp_http::Error) -> Self {
        Self::Http(err)
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<serde_urlencoded::ser::Error> for NotifyError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Self::Form(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plug(err) => write!(f, "{err}"),
            Self::Rejected { plug, on } => write!(
                f,
                "{plug} refused to switch {}",
                if *on { "on" } else { "off" }
            ),
        }
    }
}

impl fmt::Display for PlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plug communication failed (ip: {}, type: {}) during {}: {}",
            self.plug.ip, self.plug.vendor, self.operation, self.cause
        )
    }
}

impl fmt::Display for PlugFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hs1xx(err) => write!(f, "{err}"),
            Self::Wemo(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "set ENV variable {name}"),
            Self::Invalid {
                name,
                value,
                expected,
            } => write!(f, "{name}={value:?} is invalid, expected {expected}"),
            Self::IncompleteTextbelt => write!(
                f,
                "TEXTBELT_KEY and TEXTBELT_NUMBER must be set together"
            ),
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlParse(err) => write!(f, "url parse error: {err}"),
            Self::Http(err) => write!(f, "http error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Form(err) => write!(f, "form encoding error: {err}"),
            Self::Rejected(reason) => write!(f, "text message rejected: {reason}"),
            Self::Timeout => write!(f, "text message gateway timed out"),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for PlugError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            PlugFailure::Hs1xx(err) => Some(err),
            PlugFailure::Wemo(err) => Some(err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for NotifyError {}
