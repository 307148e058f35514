use std::collections::HashMap;

use serde::Serialize;

use super::entity::Entity;
use super::thermostat::FanState;
use super::thermostat::Operation;
use super::thermostat::TemperatureUnit;
use super::thermostat::ThermostatDevice;

/// State of a thermostat entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermostatState {
    pub name: String,

    /// Primary display value: the target temperature, or "unknown"
    pub state: String,

    pub unit_of_measurement: TemperatureUnit,
    pub current_temperature: Option<f64>,
    pub temperature: Option<f64>,
    pub target_temperature_low: Option<f64>,
    pub target_temperature_high: Option<f64>,
    pub min_temp: f64,
    pub max_temp: f64,
    pub away_mode: Option<bool>,
    pub fan: Option<FanState>,
    pub operation: Option<Operation>,

    /// Vendor-specific attributes
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ThermostatState {
    /// Read every property of a thermostat into a snapshot.
    ///
    /// The away flag is read before the device attributes, so a device that
    /// reconciles its away flag while reading `mode` reports the value it held
    /// beforehand.
    pub fn capture(device: &mut dyn ThermostatDevice) -> Self {
        let away_mode = device.is_away_mode_on();
        let attributes = device.device_state_attributes();

        Self {
            name: device.name().to_string(),
            state: device.state(),
            unit_of_measurement: device.unit_of_measurement(),
            current_temperature: device.current_temperature(),
            temperature: device.target_temperature(),
            target_temperature_low: device.target_temperature_low(),
            target_temperature_high: device.target_temperature_high(),
            min_temp: device.min_temp(),
            max_temp: device.max_temp(),
            away_mode,
            fan: device.fan(),
            operation: device.operation(),
            attributes,
        }
    }
}

/// State of a link entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkState {
    pub name: String,

    /// The link's URL
    pub state: String,

    pub icon: Option<String>,
}

impl LinkState {
    pub fn capture(entity: &dyn Entity) -> Self {
        Self {
            name: entity.name().to_string(),
            state: entity.state(),
            icon: entity.icon().map(str::to_string),
        }
    }
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub thermostats: HashMap<String, ThermostatState>,
    pub links: HashMap<String, LinkState>,
}

impl State {
    /// Serialize the state of a single entity, if it is known
    pub fn entity_json(&self, entity_id: &str) -> Option<serde_json::Value> {
        if let Some(thermostat) = self.thermostats.get(entity_id) {
            return serde_json::to_value(thermostat).ok();
        }
        self.links
            .get(entity_id)
            .and_then(|link| serde_json::to_value(link).ok())
    }
}
