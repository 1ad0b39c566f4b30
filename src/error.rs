use std::fmt;

use crate::types::HeatPumpMode;

/// Coarse classification of [`Error`], for callers that only need to know
/// who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, timeout, or use of a closed client.
    Network,
    /// Credentials rejected or no token issued.
    Auth,
    /// The vendor reported a failure.
    Api,
    /// The caller passed a value the device would not accept, or local
    /// setup such as the message log path is unusable.
    InvalidInput,
}

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Timeout,
    Closed,
    Auth(String),
    Api {
        code: Option<String>,
        message: String,
    },
    TemperatureOutOfRange {
        mode: HeatPumpMode,
        value: f64,
        min: f64,
        max: f64,
    },
    Config(String),
    Io(std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) | Error::Timeout | Error::Closed => ErrorKind::Network,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Api { .. } => ErrorKind::Api,
            Error::TemperatureOutOfRange { .. } | Error::Config(_) | Error::Io(_) => {
                ErrorKind::InvalidInput
            }
        }
    }

    /// Vendor error code, when the failure came from a response envelope.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn api(code: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Closed => write!(f, "client is closed"),
            Error::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Error::Api {
                code: Some(code),
                message,
            } => write!(f, "API error {code}: {message}"),
            Error::Api { code: None, message } => write!(f, "API error: {message}"),
            Error::TemperatureOutOfRange {
                mode,
                value,
                min,
                max,
            } => write!(
                f,
                "{} setpoint {value} out of range {min}..={max}",
                mode.as_label()
            ),
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::Timeout.kind(), ErrorKind::Network);
        assert_eq!(Error::Closed.kind(), ErrorKind::Network);
        assert_eq!(Error::Auth("no token".into()).kind(), ErrorKind::Auth);
        assert_eq!(Error::api(Some("500".into()), "boom").kind(), ErrorKind::Api);
    }

    #[test]
    fn local_io_failure_is_not_a_network_error() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "log file",
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn api_display_includes_code() {
        let err = Error::api(Some("1002".into()), "device offline");
        assert_eq!(err.to_string(), "API error 1002: device offline");
        assert_eq!(err.api_code(), Some("1002"));

        let err = Error::api(None, "missing success flag");
        assert_eq!(err.to_string(), "API error: missing success flag");
    }

    #[test]
    fn out_of_range_display() {
        let err = Error::TemperatureOutOfRange {
            mode: HeatPumpMode::Cool,
            value: 30.0,
            min: 5.0,
            max: 25.0,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "cool setpoint 30 out of range 5..=25");
    }
}
