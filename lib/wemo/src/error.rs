#[derive(Debug)]
pub enum Error {
    UrlParse(chipp_http::UrlParseError),
    Http(chipp_http::Error),
    Timeout(&'static str),
    MissingValue(&'static str),
    InvalidInsightParams(String),
}

impl From<chipp_http::UrlParseError> for Error {
    fn from(err: chipp_http::UrlParseError) -> Self {
        Self::UrlParse(err)
    }
}

impl From<chipp_http::Error> for Error {
    fn from(err: chipp_http::Error) -> Self {
        Self::Http(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::UrlParse(err) => write!(f, "URL parse error: {err}"),
            Self::Http(err) => write!(f, "HTTP error: {err}"),
            Self::Timeout(action) => write!(f, "{action} timed out"),
            Self::MissingValue(tag) => write!(f, "response has no <{tag}> value"),
            Self::InvalidInsightParams(raw) => write!(f, "invalid insight params: {raw}"),
        }
    }
}

impl std::error::Error for Error {}
