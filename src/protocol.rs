use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::types::{ControlCommand, HeatPumpMode, lenient_opt_string};

pub const DEFAULT_BASE_URL: &str = "https://server.phnixsmart.com/crmservice/api/app";
pub const DEFAULT_PROTOCOL_ID: &str = "1679324789907087360";
pub const DEFAULT_LOGIN_SOURCE: &str = "Web";
pub const LOGIN_TYPE: &str = "1";
pub const TOKEN_HEADER: &str = "x-token";

pub const LOGIN_ENDPOINT: &str = "/user/login";
pub const CONTROL_ENDPOINT: &str = "/device/createDeviceControlConfigData";
pub const STATUS_ENDPOINT: &str = "/device/getControlDetailStatusByDeviceCode";
pub const CONFIG_ENDPOINT: &str = "/device/getControlParamConfigByDeviceCode";

pub const STATUS_PAGE_SIZE: u32 = 9999;
pub const CONFIG_PAGE_SIZE: u32 = 10;

pub const ADDRESS_POWER: &str = "1011";
pub const ADDRESS_MODE: &str = "1012";
pub const ADDRESS_COOL_SETPOINT: &str = "1158";
pub const ADDRESS_HEAT_SETPOINT: &str = "1159";

pub const POWER_ON: &str = "1";
pub const POWER_OFF: &str = "0";

/// Lowercase hex MD5, the digest the login endpoint expects in place of the
/// plain password.
pub fn hash_password(password: &SecretString) -> String {
    format!("{:x}", md5::compute(password.expose_secret().as_bytes()))
}

pub fn login_body(login_source: &str, username: &str, password_digest: &str) -> Value {
    json!({
        "loginSource": login_source,
        "type": LOGIN_TYPE,
        "userName": username,
        "password": password_digest
    })
}

pub fn control_body(device_code: &str, protocol_id: &str, command: &ControlCommand) -> Value {
    json!({
        "deviceCode": device_code,
        "protocalId": protocol_id,
        "address": command.address,
        "value": command.value
    })
}

pub fn status_body(device_code: &str, protocol_id: &str) -> Value {
    json!({
        "protocalId": protocol_id,
        "pageIndex": 1,
        "pageSize": STATUS_PAGE_SIZE,
        "deviceCode": device_code,
        "content": "",
        "num": ""
    })
}

pub fn config_body(device_code: &str, address: &str) -> Value {
    json!({
        "deviceCode": device_code,
        "pageIndex": 1,
        "pageSize": CONFIG_PAGE_SIZE,
        "address": address
    })
}

pub fn power_command(on: bool) -> ControlCommand {
    ControlCommand {
        address: ADDRESS_POWER,
        value: if on { POWER_ON } else { POWER_OFF }.to_string(),
    }
}

pub fn mode_command(mode: HeatPumpMode) -> ControlCommand {
    ControlCommand {
        address: ADDRESS_MODE,
        value: mode.as_wire_value().to_string(),
    }
}

pub fn setpoint_address(mode: HeatPumpMode) -> &'static str {
    match mode {
        HeatPumpMode::Cool => ADDRESS_COOL_SETPOINT,
        HeatPumpMode::Heat => ADDRESS_HEAT_SETPOINT,
    }
}

/// The controller only takes whole degrees; fractions are truncated. NaN and
/// infinities have no integer encoding and are rejected.
pub fn temperature_command(value: f64, mode: HeatPumpMode) -> Result<ControlCommand> {
    if !value.is_finite() {
        let (min, max) = mode.setpoint_range();
        return Err(Error::TemperatureOutOfRange {
            mode,
            value,
            min,
            max,
        });
    }
    Ok(ControlCommand {
        address: setpoint_address(mode),
        value: (value.trunc() as i64).to_string(),
    })
}

/// The vendor's uniform response wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(
        rename = "isResultSuccessFlag",
        alias = "isResultSuc",
        alias = "isReusltSuc",
        default
    )]
    success: Option<Value>,
    #[serde(rename = "objectResult", default)]
    pub object_result: Option<Value>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub error_msg: Option<String>,
}

impl Envelope {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::api(None, format!("invalid response body: {e}")))
    }

    /// Only an explicit boolean `true` counts; a missing flag is a failure.
    pub fn is_success(&self) -> bool {
        matches!(self.success, Some(Value::Bool(true)))
    }

    /// Failure envelopes that ask the client to log in again.
    pub fn is_auth_failure(&self) -> bool {
        if self.is_success() {
            return false;
        }
        if matches!(self.error_code.as_deref(), Some("401")) {
            return true;
        }
        self.error_msg.as_deref().is_some_and(|msg| {
            let lower = msg.to_lowercase();
            msg.contains("登录") || lower.contains("login") || lower.contains("token")
        })
    }

    pub fn message(&self) -> String {
        self.error_msg
            .clone()
            .unwrap_or_else(|| "unknown error".to_string())
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self.message();
            Err(Error::api(self.error_code, message))
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.object_result
            .as_ref()
            .and_then(|r| r.get("token"))
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
    }

    /// `objectResult.dataList`, empty when the vendor omits it.
    pub fn data_list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        match self.object_result.as_ref().and_then(|r| r.get("dataList")) {
            Some(Value::Array(items)) => serde_json::from_value(Value::Array(items.clone()))
                .map_err(|e| Error::api(None, format!("malformed dataList: {e}"))),
            _ => Ok(Vec::new()),
        }
    }
}
