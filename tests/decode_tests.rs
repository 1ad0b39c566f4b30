use phnix_cloud::sensors::{BINARY_SENSORS, Category, NUMERIC_SENSORS};
use phnix_cloud::{
    DeviceStatus, HeatPumpMode, HvacMode, TelemetryRecord, Unit, Value, decode, decode_climate,
};

fn rec(address: &str, value: &str) -> TelemetryRecord {
    TelemetryRecord::new(address, value)
}

#[test]
fn empty_poll_decodes_to_nothing() {
    assert!(decode(&[], NUMERIC_SENSORS).is_empty());
    assert!(decode(&[], BINARY_SENSORS).is_empty());

    let state = decode_climate(&[]);
    assert!(!state.power);
    assert_eq!(state.hvac_mode, HvacMode::Off);
    assert_eq!(state.current_temperature, None);
    assert_eq!(state.target_temperature, None);
}

#[test]
fn garbage_values_never_fail() {
    let records = vec![
        rec("2045", "n/a"),
        rec("2046", ""),
        rec("2047", "NaN"),
        rec("2019", "xyz"),
        rec("", "1"),
    ];
    let readings = decode(&records, NUMERIC_SENSORS);
    assert_eq!(
        readings.get("inlet_water_temp").unwrap().value,
        Value::Opaque("n/a".into())
    );
    assert_eq!(decode_climate(&records).current_temperature, None);
}

#[test]
fn duplicate_address_first_record_wins() {
    let records = vec![rec("2045", "30"), rec("2045", "99")];
    let readings = decode(&records, NUMERIC_SENSORS);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings.get("inlet_water_temp").unwrap().value, Value::Int(30));
}

#[test]
fn numeric_readings_carry_units() {
    let records = vec![rec("2070", "12.5"), rec("2025", "58"), rec("2033", "3.9")];
    let readings = decode(&records, NUMERIC_SENSORS);

    let pressure = readings.get("suction_pressure").unwrap();
    assert_eq!(pressure.value, Value::Float(12.5));
    assert_eq!(pressure.unit, Some(Unit::Bar));
    assert_eq!(pressure.to_string(), "Suction pressure: 12.5 bar");

    assert_eq!(readings.get("comp_freq").unwrap().value, Value::Int(58));
    assert_eq!(readings.get("cop").unwrap().unit, None);
}

#[test]
fn packed_flags_need_matching_slot() {
    let records = vec![
        TelemetryRecord::with_num("2019", "O01", "1"),
        TelemetryRecord::with_num("2019", "O07", "0"),
        TelemetryRecord::with_num("2019", "bit14", "1"),
        TelemetryRecord::with_num("2034", "S01", "1"),
    ];
    let flags = decode(&records, BINARY_SENSORS);
    assert_eq!(flags.get("compressor_output").unwrap().value, Value::Bool(true));
    assert_eq!(flags.get("water_pump_output").unwrap().value, Value::Bool(false));
    assert_eq!(flags.get("heat_water_valve_output").unwrap().value, Value::Bool(true));
    assert_eq!(flags.get("high_pressure_switch").unwrap().value, Value::Bool(true));
    assert!(flags.get("alarm_output").is_none());
    assert!(flags.get("emergency_switch").is_none());
    assert!(flags.get("power_status").is_none());
}

#[test]
fn flag_is_true_only_for_one() {
    for (raw, expected) in [("1", true), ("0", false), ("2", false), ("on", false)] {
        let flags = decode(&[rec("2011", raw)], BINARY_SENSORS);
        assert_eq!(
            flags.get("power_status").unwrap().value,
            Value::Bool(expected),
            "raw value {raw:?}"
        );
    }
}

#[test]
fn cool_mode_reads_cool_setpoint() {
    let records = vec![
        rec("2011", "1"),
        rec("2012", "0"),
        rec("1158", "18"),
        rec("1159", "45"),
        rec("2047", "24.5"),
    ];
    let state = decode_climate(&records);
    assert!(state.power);
    assert_eq!(state.mode, Some(HeatPumpMode::Cool));
    assert_eq!(state.hvac_mode, HvacMode::Cool);
    assert_eq!(state.target_temperature, Some(18.0));
    assert_eq!(state.current_temperature, Some(24.5));
}

#[test]
fn status_addresses_take_precedence_over_control_addresses() {
    let records = vec![rec("1011", "1"), rec("2011", "0"), rec("2012", "1")];
    let state = decode_climate(&records);
    assert!(!state.power);
    assert_eq!(state.hvac_mode, HvacMode::Off);
}

#[test]
fn device_status_splits_tables() {
    let records = vec![
        rec("2011", "1"),
        rec("2012", "1"),
        rec("1159", "50"),
        rec("2046", "48.0"),
    ];
    let status = DeviceStatus::from_records(&records);
    assert_eq!(status.climate.hvac_mode, HvacMode::Heat);
    assert_eq!(status.climate.target_temperature, Some(50.0));
    assert_eq!(status.readings.len(), 1);
    assert_eq!(status.flags.get("power_status").unwrap().value, Value::Bool(true));
    assert!(status.readings.get("power_status").is_none());
}

#[test]
fn records_parse_from_vendor_json() {
    let raw = r#"[
        {"address": "2019", "num": "O01", "dataValue": "1", "name": "compressor"},
        {"address": 2047, "dataValue": "22.5"},
        {"address": "2045", "num": "", "dataValue": null}
    ]"#;
    let records: Vec<TelemetryRecord> = serde_json::from_str(raw).unwrap();
    assert_eq!(records[0].num.as_deref(), Some("O01"));
    assert_eq!(records[1].address, "2047");
    assert_eq!(records[2].num, None);
    assert_eq!(records[2].data_value, None);

    let state = decode_climate(&records);
    assert_eq!(state.current_temperature, Some(22.5));
}

#[test]
fn empty_wire_value_passes_through_as_opaque() {
    let records: Vec<TelemetryRecord> =
        serde_json::from_str(r#"[{"address": "2045", "dataValue": ""}]"#).unwrap();
    let readings = decode(&records, NUMERIC_SENSORS);
    assert_eq!(
        readings.get("inlet_water_temp").unwrap().value,
        Value::Opaque(String::new())
    );
}

#[test]
fn readings_group_by_category() {
    let records = vec![
        rec("2045", "30"),
        rec("2046", "35"),
        rec("2070", "12.5"),
        TelemetryRecord::with_num("2019", "O01", "1"),
        TelemetryRecord::with_num("2034", "S04", "0"),
    ];
    let status = DeviceStatus::from_records(&records);

    let temps: Vec<&str> = status
        .readings
        .in_category(Category::Temperature)
        .map(|r| r.key)
        .collect();
    assert_eq!(temps, vec!["inlet_water_temp", "outlet_water_temp"]);
    assert_eq!(status.readings.in_category(Category::Pressure).count(), 1);
    assert_eq!(status.readings.in_category(Category::Flow).count(), 0);
    assert_eq!(status.flags.in_category(Category::Output).count(), 1);
    assert_eq!(status.flags.in_category(Category::SafetySwitch).count(), 1);
    assert_eq!(Category::SafetySwitch.label(), "Safety switches");
}
