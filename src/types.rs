use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub const COOL_SETPOINT_MIN: f64 = 5.0;
pub const COOL_SETPOINT_MAX: f64 = 25.0;
pub const HEAT_SETPOINT_MIN: f64 = 25.0;
pub const HEAT_SETPOINT_MAX: f64 = 60.0;

/// Operating mode as understood by the controller. Off is expressed through
/// the power address, not the mode address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatPumpMode {
    Cool,
    Heat,
}

impl HeatPumpMode {
    pub fn as_wire_value(&self) -> &'static str {
        match self {
            HeatPumpMode::Cool => "0",
            HeatPumpMode::Heat => "1",
        }
    }

    pub fn from_wire_value(s: &str) -> Option<Self> {
        match s.trim() {
            "0" => Some(HeatPumpMode::Cool),
            "1" => Some(HeatPumpMode::Heat),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            HeatPumpMode::Cool => "cool",
            HeatPumpMode::Heat => "heat",
        }
    }

    /// Inclusive setpoint bounds in °C.
    pub fn setpoint_range(&self) -> (f64, f64) {
        match self {
            HeatPumpMode::Cool => (COOL_SETPOINT_MIN, COOL_SETPOINT_MAX),
            HeatPumpMode::Heat => (HEAT_SETPOINT_MIN, HEAT_SETPOINT_MAX),
        }
    }

    pub fn validate_setpoint(&self, value: f64) -> Result<()> {
        let (min, max) = self.setpoint_range();
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Error::TemperatureOutOfRange {
                mode: *self,
                value,
                min,
                max,
            })
        }
    }
}

/// Combined power + mode state, the shape a thermostat UI works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacMode {
    #[default]
    Off,
    Cool,
    Heat,
}

impl From<HeatPumpMode> for HvacMode {
    fn from(mode: HeatPumpMode) -> Self {
        match mode {
            HeatPumpMode::Cool => HvacMode::Cool,
            HeatPumpMode::Heat => HvacMode::Heat,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Credentials {
    Password {
        username: String,
        password: SecretString,
    },
    /// Pre-issued long-lived token. Re-login hands the same token back.
    Token(SecretString),
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(SecretString::from(token.into()))
    }
}

/// One entry of a status poll. `num` discriminates flags packed under the
/// same address (outputs, safety switches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub num: Option<String>,
    #[serde(rename = "dataValue", default, deserialize_with = "raw_value")]
    pub data_value: Option<String>,
}

impl TelemetryRecord {
    pub fn new(address: impl Into<String>, data_value: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            num: None,
            data_value: Some(data_value.into()),
        }
    }

    pub fn with_num(
        address: impl Into<String>,
        num: impl Into<String>,
        data_value: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            num: Some(num.into()),
            data_value: Some(data_value.into()),
        }
    }
}

/// A single keyed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub address: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Celsius,
    Bar,
    CubicMetersPerHour,
    Volt,
    Ampere,
    Watt,
    Kilowatt,
    KilowattHour,
    Hertz,
    Rpm,
    Hours,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "\u{00b0}C",
            Unit::Bar => "bar",
            Unit::CubicMetersPerHour => "m\u{00b3}/h",
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Watt => "W",
            Unit::Kilowatt => "kW",
            Unit::KilowattHour => "kWh",
            Unit::Hertz => "Hz",
            Unit::Rpm => "rpm",
            Unit::Hours => "h",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Raw vendor string that could not be parsed as a number.
    Opaque(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", if *b { "on" } else { "off" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Opaque(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub key: &'static str,
    pub name: &'static str,
    pub value: Value,
    pub unit: Option<Unit>,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}: {} {}", self.name, self.value, unit.symbol()),
            None => write!(f, "{}: {}", self.name, self.value),
        }
    }
}

/// Thermostat view of one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateState {
    pub power: bool,
    pub mode: Option<HeatPumpMode>,
    pub hvac_mode: HvacMode,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
}

// The vendor is inconsistent about quoting: the same field arrives as a
// string, a number, or null depending on firmware.
fn stringify(raw: serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Empty strings collapse to `None`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(stringify).filter(|s| !s.is_empty()))
}

// Unlike `num`, an empty `dataValue` is still a reported value.
fn raw_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(stringify))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_values() {
        assert_eq!(HeatPumpMode::Cool.as_wire_value(), "0");
        assert_eq!(HeatPumpMode::Heat.as_wire_value(), "1");
        assert_eq!(HeatPumpMode::from_wire_value("1"), Some(HeatPumpMode::Heat));
        assert_eq!(HeatPumpMode::from_wire_value("2"), None);
    }

    #[test]
    fn setpoint_validation() {
        assert!(HeatPumpMode::Cool.validate_setpoint(5.0).is_ok());
        assert!(HeatPumpMode::Cool.validate_setpoint(25.0).is_ok());
        assert!(HeatPumpMode::Cool.validate_setpoint(26.0).is_err());
        assert!(HeatPumpMode::Heat.validate_setpoint(24.5).is_err());
        assert!(HeatPumpMode::Heat.validate_setpoint(60.0).is_ok());
        assert!(HeatPumpMode::Heat.validate_setpoint(f64::NAN).is_err());
    }

    #[test]
    fn record_accepts_numbers_and_nulls() {
        let rec: TelemetryRecord =
            serde_json::from_str(r#"{"address": 2047, "num": "", "dataValue": 21.5}"#).unwrap();
        assert_eq!(rec.address, "2047");
        assert_eq!(rec.num, None);
        assert_eq!(rec.data_value.as_deref(), Some("21.5"));

        let rec: TelemetryRecord =
            serde_json::from_str(r#"{"address": "2019", "num": "O01", "dataValue": null}"#)
                .unwrap();
        assert_eq!(rec.num.as_deref(), Some("O01"));
        assert_eq!(rec.data_value, None);
    }

    #[test]
    fn empty_data_value_is_kept_but_empty_num_is_dropped() {
        let rec: TelemetryRecord =
            serde_json::from_str(r#"{"address": "2045", "num": "", "dataValue": ""}"#).unwrap();
        assert_eq!(rec.num, None);
        assert_eq!(rec.data_value.as_deref(), Some(""));
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials::password("alice", "hunter2");
        let out = format!("{creds:?}");
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));
        assert!(!format!("{:?}", Credentials::token("abc123")).contains("abc123"));
    }

    #[test]
    fn reading_display_with_unit() {
        let r = Reading {
            key: "ac_voltage",
            name: "AC input voltage",
            value: Value::Int(230),
            unit: Some(Unit::Volt),
        };
        assert_eq!(r.to_string(), "AC input voltage: 230 V");
    }
}
