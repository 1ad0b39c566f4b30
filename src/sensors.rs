use crate::types::Unit;

pub const ADDRESS_POWER_STATUS: &str = "2011";
pub const ADDRESS_MODE_STATUS: &str = "2012";
pub const ADDRESS_FUNCTION_STATUS: &str = "2013";
pub const ADDRESS_INDOOR_TEMP: &str = "2047";
pub const ADDRESS_OUTPUTS: &str = "2019";
pub const ADDRESS_SAFETY_SWITCHES: &str = "2034";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Numeric(Option<Unit>),
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Temperature,
    Pressure,
    Flow,
    Electrical,
    Running,
    Communication,
    State,
    Output,
    SafetySwitch,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Temperature,
        Category::Pressure,
        Category::Flow,
        Category::Electrical,
        Category::Running,
        Category::Communication,
        Category::State,
        Category::Output,
        Category::SafetySwitch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Temperature => "Temperatures",
            Category::Pressure => "Pressures",
            Category::Flow => "Flow",
            Category::Electrical => "Electrical",
            Category::Running => "Running",
            Category::Communication => "Communication",
            Category::State => "State",
            Category::Output => "Outputs",
            Category::SafetySwitch => "Safety switches",
        }
    }
}

/// Where a reading lives in a status poll and how to coerce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDef {
    pub key: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub sub_key: Option<&'static str>,
    pub kind: SensorKind,
    pub category: Category,
}

const fn numeric(
    key: &'static str,
    name: &'static str,
    address: &'static str,
    unit: Option<Unit>,
    category: Category,
) -> SensorDef {
    SensorDef {
        key,
        name,
        address,
        sub_key: None,
        kind: SensorKind::Numeric(unit),
        category,
    }
}

const fn flag(
    key: &'static str,
    name: &'static str,
    address: &'static str,
    sub_key: Option<&'static str>,
    category: Category,
) -> SensorDef {
    SensorDef {
        key,
        name,
        address,
        sub_key,
        kind: SensorKind::Binary,
        category,
    }
}

const fn output(key: &'static str, name: &'static str, slot: &'static str) -> SensorDef {
    flag(key, name, ADDRESS_OUTPUTS, Some(slot), Category::Output)
}

const fn switch(key: &'static str, name: &'static str, slot: &'static str) -> SensorDef {
    flag(key, name, ADDRESS_SAFETY_SWITCHES, Some(slot), Category::SafetySwitch)
}

use Category::*;

pub const NUMERIC_SENSORS: &[SensorDef] = &[
    numeric("inlet_water_temp", "Inlet water temperature", "2045", Some(Unit::Celsius), Temperature),
    numeric("outlet_water_temp", "Outlet water temperature", "2046", Some(Unit::Celsius), Temperature),
    numeric("indoor_temp", "Indoor temperature", ADDRESS_INDOOR_TEMP, Some(Unit::Celsius), Temperature),
    numeric("ambient_temp", "Ambient temperature", "2048", Some(Unit::Celsius), Temperature),
    numeric("coil_temp", "Coil temperature", "2049", Some(Unit::Celsius), Temperature),
    numeric("suction_temp", "Suction temperature", "2051", Some(Unit::Celsius), Temperature),
    numeric("exhaust_temp", "Exhaust temperature", "2053", Some(Unit::Celsius), Temperature),
    numeric("frost_temp", "Antifreeze temperature", "2055", Some(Unit::Celsius), Temperature),
    numeric("hot_water_temp", "Hot water temperature", "2056", Some(Unit::Celsius), Temperature),
    numeric("evi_inlet_temp", "EVI inlet temperature", "2063", Some(Unit::Celsius), Temperature),
    numeric("evi_outlet_temp", "EVI outlet temperature", "2064", Some(Unit::Celsius), Temperature),
    numeric("suction_pressure", "Suction pressure", "2070", Some(Unit::Bar), Pressure),
    numeric("exhaust_pressure", "Exhaust pressure", "2071", Some(Unit::Bar), Pressure),
    numeric("water_flow", "Water flow", "2057", Some(Unit::CubicMetersPerHour), Flow),
    numeric("ac_voltage", "AC input voltage", "2038", Some(Unit::Volt), Electrical),
    numeric("ac_current", "AC input current", "2039", Some(Unit::Ampere), Electrical),
    numeric("comp_current", "Compressor phase current", "2040", Some(Unit::Ampere), Electrical),
    numeric("dc_bus_voltage", "DC bus voltage", "2041", Some(Unit::Volt), Electrical),
    numeric("ipm_temp", "IPM temperature", "2042", Some(Unit::Celsius), Electrical),
    numeric("power_input", "Input power", "2031", Some(Unit::Watt), Electrical),
    numeric("heat_pump_capacity", "Heat pump capacity", "2032", Some(Unit::Kilowatt), Electrical),
    numeric("cop", "COP", "2033", None, Electrical),
    numeric("comp_freq", "Compressor frequency", "2025", Some(Unit::Hertz), Running),
    numeric("fan1_speed", "Fan 1 speed", "2029", Some(Unit::Rpm), Running),
    numeric("fan2_speed", "Fan 2 speed", "2030", Some(Unit::Rpm), Running),
    numeric("eev_opening", "EEV opening", "2020", None, Running),
    numeric("evi_eev_opening", "EVI EEV opening", "2021", None, Running),
    numeric("comp_runtime", "Compressor runtime", "2043", Some(Unit::Hours), Running),
    numeric("electricity", "Energy meter", "2035", Some(Unit::KilowattHour), Running),
    numeric("dtu_signal", "DTU signal strength", "2037", None, Communication),
    numeric("dtu_online", "DTU online", "2130", None, Communication),
    numeric("multi_unit_comm", "Multi-unit communication", "2059", None, Communication),
];

pub const BINARY_SENSORS: &[SensorDef] = &[
    flag("power_status", "Power", ADDRESS_POWER_STATUS, None, State),
    flag("mode_status", "Running mode", ADDRESS_MODE_STATUS, None, State),
    flag("function_status", "Running function", ADDRESS_FUNCTION_STATUS, None, State),
    output("compressor_output", "Compressor", "O01"),
    output("secondary_pump_output", "Secondary pump", "O02"),
    output("high_fan_output", "High fan", "O03"),
    output("low_fan_output", "Low fan", "O04"),
    output("four_way_valve_output", "Four-way valve", "O05"),
    output("hot_water_valve_output", "Hot water three-way valve", "O06"),
    output("water_pump_output", "Water pump", "O07"),
    output("electric_heat_output", "Electric heater", "O08"),
    output("spray_valve_output", "Spray valve", "O09"),
    output("frost_heat_output", "Antifreeze heater", "O10"),
    output("crankcase_heat_output", "Crankcase heater", "O11"),
    output("water_supply_output", "Water supply valve", "bit11"),
    output("alarm_output", "Alarm", "O13"),
    output("cool_water_valve_output", "Cooling water valve", "bit13"),
    output("heat_water_valve_output", "Heating water valve", "bit14"),
    switch("high_pressure_switch", "High pressure switch", "S01"),
    switch("low_pressure_switch", "Low pressure switch", "S03"),
    switch("water_flow_switch", "Water flow switch", "S04"),
    switch("dry_burn_switch", "Heater dry-burn switch", "S05"),
    switch("mode_input_switch", "Mode input", "S06"),
    switch("emergency_switch", "Emergency switch", "S09"),
];

pub fn find(key: &str) -> Option<&'static SensorDef> {
    NUMERIC_SENSORS
        .iter()
        .chain(BINARY_SENSORS)
        .find(|def| def.key == key)
}
