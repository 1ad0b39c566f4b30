use std::collections::{BTreeMap, HashMap};

use crate::protocol::{ADDRESS_COOL_SETPOINT, ADDRESS_HEAT_SETPOINT, ADDRESS_MODE, ADDRESS_POWER};
use crate::sensors::{
    ADDRESS_INDOOR_TEMP, ADDRESS_MODE_STATUS, ADDRESS_POWER_STATUS, BINARY_SENSORS, Category,
    NUMERIC_SENSORS, SensorDef, SensorKind, find,
};
use crate::types::{ClimateState, HeatPumpMode, HvacMode, Reading, TelemetryRecord, Value};

/// Lookup over one poll's records. The first record wins for both the plain
/// address key and the `(address, num)` key.
pub struct TelemetryIndex<'a> {
    by_address: HashMap<&'a str, Option<&'a str>>,
    by_slot: HashMap<&'a str, HashMap<&'a str, Option<&'a str>>>,
}

impl<'a> TelemetryIndex<'a> {
    pub fn new(records: &'a [TelemetryRecord]) -> Self {
        let mut by_address = HashMap::with_capacity(records.len());
        let mut by_slot: HashMap<&'a str, HashMap<&'a str, Option<&'a str>>> = HashMap::new();
        for rec in records {
            let value = rec.data_value.as_deref();
            by_address.entry(rec.address.as_str()).or_insert(value);
            if let Some(num) = rec.num.as_deref() {
                by_slot
                    .entry(rec.address.as_str())
                    .or_default()
                    .entry(num)
                    .or_insert(value);
            }
        }
        Self { by_address, by_slot }
    }

    /// `None` when no record matched; `Some(None)` when a record matched but
    /// carried no value.
    pub fn lookup(&self, address: &str, sub_key: Option<&str>) -> Option<Option<&'a str>> {
        match sub_key {
            Some(num) => self.by_slot.get(address)?.get(num).copied(),
            None => self.by_address.get(address).copied(),
        }
    }

    pub fn value(&self, address: &str) -> Option<&'a str> {
        self.lookup(address, None).flatten()
    }
}

/// Decoded readings keyed by sensor key. Unmatched sensors are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings(BTreeMap<&'static str, Reading>);

impl Readings {
    pub fn get(&self, key: &str) -> Option<&Reading> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.0.values()
    }

    /// Readings whose sensor belongs to `category`, in key order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Reading> {
        self.0
            .values()
            .filter(move |r| find(r.key).is_some_and(|def| def.category == category))
    }
}

pub fn coerce_flag(raw: Option<&str>) -> bool {
    raw == Some("1")
}

pub fn coerce_number(raw: &str) -> Value {
    let parsed = if raw.contains('.') {
        raw.parse::<f64>().ok().map(Value::Float)
    } else {
        raw.parse::<i64>().ok().map(Value::Int)
    };
    parsed.unwrap_or_else(|| Value::Opaque(raw.to_string()))
}

fn read(index: &TelemetryIndex<'_>, def: &SensorDef) -> Option<Reading> {
    let matched = index.lookup(def.address, def.sub_key)?;
    let (value, unit) = match def.kind {
        SensorKind::Binary => (Value::Bool(coerce_flag(matched)), None),
        SensorKind::Numeric(unit) => (coerce_number(matched?), unit),
    };
    Some(Reading {
        key: def.key,
        name: def.name,
        value,
        unit,
    })
}

pub fn decode_indexed(index: &TelemetryIndex<'_>, defs: &[SensorDef]) -> Readings {
    let mut out = BTreeMap::new();
    for def in defs {
        if let Some(reading) = read(index, def) {
            out.entry(def.key).or_insert(reading);
        }
    }
    Readings(out)
}

/// Never fails: malformed values become `Value::Opaque`, missing ones are
/// left out.
pub fn decode(records: &[TelemetryRecord], defs: &[SensorDef]) -> Readings {
    decode_indexed(&TelemetryIndex::new(records), defs)
}

fn parse_temperature(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|t| t.is_finite())
}

pub fn decode_climate_indexed(index: &TelemetryIndex<'_>) -> ClimateState {
    let power = index
        .value(ADDRESS_POWER_STATUS)
        .or_else(|| index.value(ADDRESS_POWER));
    let power = coerce_flag(power);

    let mode = index
        .value(ADDRESS_MODE_STATUS)
        .or_else(|| index.value(ADDRESS_MODE))
        .and_then(HeatPumpMode::from_wire_value);

    let target_temperature = match mode {
        Some(HeatPumpMode::Cool) => parse_temperature(index.value(ADDRESS_COOL_SETPOINT)),
        Some(HeatPumpMode::Heat) => parse_temperature(index.value(ADDRESS_HEAT_SETPOINT)),
        None => None,
    };

    let hvac_mode = match (power, mode) {
        (true, Some(m)) => HvacMode::from(m),
        _ => HvacMode::Off,
    };

    ClimateState {
        power,
        mode,
        hvac_mode,
        current_temperature: parse_temperature(index.value(ADDRESS_INDOOR_TEMP)),
        target_temperature,
    }
}

pub fn decode_climate(records: &[TelemetryRecord]) -> ClimateState {
    decode_climate_indexed(&TelemetryIndex::new(records))
}

/// Everything one status poll says about the unit, decoded against the
/// built-in sensor tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatus {
    pub climate: ClimateState,
    pub readings: Readings,
    pub flags: Readings,
}

impl DeviceStatus {
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let index = TelemetryIndex::new(records);
        Self {
            climate: decode_climate_indexed(&index),
            readings: decode_indexed(&index, NUMERIC_SENSORS),
            flags: decode_indexed(&index, BINARY_SENSORS),
        }
    }
}
