use std::fmt;
use std::net::SocketAddr;

use crate::Command;

#[derive(Debug)]
pub enum Error {
    /// The TCP connection to the plug could not be established in time.
    Connection {
        addr: SocketAddr,
        cause: ConnectFailure,
    },
    /// The plug accepted the connection but did not answer per protocol.
    Incompatible {
        method: &'static str,
        cause: Incompatible,
    },
}

#[derive(Debug)]
pub enum ConnectFailure {
    TimedOut,
    Io(std::io::Error),
}

#[derive(Debug)]
pub enum Incompatible {
    Io(std::io::Error),
    SendTimeout,
    ReceiveTimeout,
    Json(serde_json::Error),
    MissingSection {
        module: &'static str,
        method: &'static str,
    },
}

impl Error {
    pub(crate) fn incompatible(command: &Command, cause: Incompatible) -> Self {
        Self::Incompatible {
            method: command.method(),
            cause,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<std::io::Error> for Incompatible {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Incompatible {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { addr, cause } => write!(f, "unable to connect to {addr}: {cause}"),
            Self::Incompatible { method, cause } => {
                write!(f, "non compatible device response to {method}: {cause}")
            }
        }
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "connect timed out"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl fmt::Display for Incompatible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::SendTimeout => write!(f, "send timed out"),
            Self::ReceiveTimeout => write!(f, "no response before receive timeout"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::MissingSection { module, method } => {
                write!(f, "response has no {module}.{method} section")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection {
                cause: ConnectFailure::Io(err),
                ..
            } => Some(err),
            Self::Incompatible {
                cause: Incompatible::Io(err),
                ..
            } => Some(err),
            Self::Incompatible {
                cause: Incompatible::Json(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}
