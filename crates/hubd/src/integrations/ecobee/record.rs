//! Thermostat records in the vendor's JSON shape.
//!
//! Temperatures are tenths of a degree Fahrenheit, e.g. `actualTemperature:
//! 712` is 71.2°F.

use serde::Deserialize;
use serde::Serialize;

/// Body of a thermostat summary response: `{"thermostatList": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatList {
    pub thermostat_list: Vec<ThermostatRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatRecord {
    /// Vendor serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    pub name: String,
    pub program: Program,
    pub runtime: Runtime,

    /// Comma-joined active equipment, e.g. "heatPump,fan"; empty when idle
    #[serde(default)]
    pub equipment_status: String,

    pub settings: Settings,

    /// Sections we don't map are kept so a rewritten document loses nothing
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub current_climate_ref: String,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    pub actual_temperature: i64,
    pub actual_humidity: i64,
    pub desired_heat: i64,
    pub desired_cool: i64,
    pub desired_fan_mode: String,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// One of auto, auxHeatOnly, cool, heat, off
    pub hvac_mode: String,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thermostat_list() {
        let json = r#"{
            "thermostatList": [{
                "identifier": "411922740271",
                "name": "Main Floor",
                "brand": "ecobee",
                "program": {"currentClimateRef": "sleep", "climates": []},
                "runtime": {
                    "connected": true,
                    "actualTemperature": 688,
                    "actualHumidity": 38,
                    "desiredHeat": 680,
                    "desiredCool": 780,
                    "desiredFanMode": "on"
                },
                "equipmentStatus": "heatPump,fan",
                "settings": {"hvacMode": "heat", "useCelsius": false}
            }]
        }"#;

        let list: ThermostatList = serde_json::from_str(json).unwrap();
        let record = &list.thermostat_list[0];
        assert_eq!(record.name, "Main Floor");
        assert_eq!(record.program.current_climate_ref, "sleep");
        assert_eq!(record.runtime.actual_temperature, 688);
        assert_eq!(record.runtime.desired_fan_mode, "on");
        assert_eq!(record.equipment_status, "heatPump,fan");
        assert_eq!(record.settings.hvac_mode, "heat");

        // Unmapped vendor fields survive a write-back
        let written = serde_json::to_value(&list).unwrap();
        assert_eq!(written["thermostatList"][0]["brand"], "ecobee");
        assert_eq!(written["thermostatList"][0]["runtime"]["connected"], true);
        assert_eq!(
            written["thermostatList"][0]["settings"]["useCelsius"],
            false
        );
    }

    #[test]
    fn test_missing_equipment_status_is_idle() {
        let json = serde_json::json!({
            "name": "Basement",
            "program": { "currentClimateRef": "home" },
            "runtime": {
                "actualTemperature": 650,
                "actualHumidity": 50,
                "desiredHeat": 640,
                "desiredCool": 760,
                "desiredFanMode": "auto"
            },
            "settings": { "hvacMode": "off" }
        });
        let record: ThermostatRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.equipment_status, "");
        assert_eq!(record.identifier, None);
    }
}
