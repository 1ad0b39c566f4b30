use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::protocol::DEFAULT_PROTOCOL_ID;
use crate::types::Credentials;
use crate::{Error, Result};

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NAME: &str = "Phnix heat pump";

/// Connection settings as a host application stores them, e.g. in a JSON
/// config entry. Either `token` or `username` + `password` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "opt_secret")]
    pub password: Option<SecretString>,
    #[serde(default, deserialize_with = "opt_secret")]
    pub token: Option<SecretString>,
    pub device_code: String,
    #[serde(default = "default_protocol_id")]
    pub protocol_id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn opt_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn default_protocol_id() -> String {
    DEFAULT_PROTOCOL_ID.to_string()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        if config.device_code.trim().is_empty() {
            return Err(Error::Config("device_code is empty".to_string()));
        }
        config.credentials()?;
        Ok(config)
    }

    /// Username/password wins over a token when both are given, since only
    /// a password can be used to log in again.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password, &self.token) {
            (Some(user), Some(pass), _) => Ok(Credentials::Password {
                username: user.clone(),
                password: pass.clone(),
            }),
            (_, _, Some(token)) if !token.expose_secret().is_empty() => {
                Ok(Credentials::Token(token.clone()))
            }
            (Some(_), None, _) => Err(Error::Config("password is missing".to_string())),
            _ => Err(Error::Config(
                "either username/password or token is required".to_string(),
            )),
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
