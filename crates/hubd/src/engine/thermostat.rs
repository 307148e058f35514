//! Thermostat capability shared by all thermostat integrations.

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::Serializer;

use super::entity::Entity;

/// Unit a thermostat reports its temperatures in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum TemperatureUnit {
    #[serde(rename = "°C")]
    #[strum(serialize = "°C")]
    Celsius,
    #[serde(rename = "°F")]
    #[strum(serialize = "°F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Express a Celsius temperature in this unit
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FanState {
    On,
    Off,
}

/// What the HVAC equipment is currently doing.
///
/// Vendors report free-form equipment status; anything without a generic
/// meaning is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Idle,
    Heat,
    Cool,
    Other(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Idle => f.write_str("idle"),
            Operation::Heat => f.write_str("heat"),
            Operation::Cool => f.write_str("cool"),
            Operation::Other(status) => f.write_str(status),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Commands the engine can route to a thermostat
#[derive(Debug, Clone, PartialEq)]
pub enum ThermostatCommand {
    SetTemperature(f64),
    SetAwayMode(bool),
    SetHvacMode(String),
}

fn unsupported(entity_id: &str, what: &str) -> Box<dyn Error + Send> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{} does not support {}", entity_id, what),
    ))
}

/// Capability implemented by every thermostat, whatever the vendor.
///
/// Readers take `&self` except `mode`, which may reconcile vendor-side cached
/// flags as it reads the current program.
#[async_trait]
pub trait ThermostatDevice: Entity {
    fn unit_of_measurement(&self) -> TemperatureUnit;

    fn current_temperature(&self) -> Option<f64>;

    /// The temperature the device is trying to reach
    fn target_temperature(&self) -> Option<f64>;

    fn target_temperature_low(&self) -> Option<f64> {
        None
    }

    fn target_temperature_high(&self) -> Option<f64> {
        None
    }

    fn humidity(&self) -> Option<f64> {
        None
    }

    fn fan(&self) -> Option<FanState> {
        None
    }

    fn operation(&self) -> Option<Operation> {
        None
    }

    /// Current comfort program, e.g. "home", "away", "sleep"
    fn mode(&mut self) -> Option<String> {
        None
    }

    fn hvac_mode(&self) -> Option<String> {
        None
    }

    fn is_away_mode_on(&self) -> Option<bool> {
        None
    }

    fn min_temp(&self) -> f64 {
        self.unit_of_measurement().from_celsius(7.0)
    }

    fn max_temp(&self) -> f64 {
        self.unit_of_measurement().from_celsius(35.0)
    }

    /// Vendor-specific attributes reported alongside the generic ones
    fn device_state_attributes(&mut self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    /// Refresh the device's view of the world
    async fn update(&mut self) -> Result<(), Box<dyn Error + Send>>;

    async fn set_temperature(&mut self, temperature: f64) -> Result<(), Box<dyn Error + Send>>;

    async fn turn_away_mode_on(&mut self) -> Result<(), Box<dyn Error + Send>> {
        Err(unsupported(self.entity_id(), "away mode"))
    }

    async fn turn_away_mode_off(&mut self) -> Result<(), Box<dyn Error + Send>> {
        Err(unsupported(self.entity_id(), "away mode"))
    }

    async fn set_hvac_mode(&mut self, _mode: &str) -> Result<(), Box<dyn Error + Send>> {
        Err(unsupported(self.entity_id(), "hvac modes"))
    }

    /// Execute a routed command
    async fn apply(&mut self, command: ThermostatCommand) -> Result<(), Box<dyn Error + Send>> {
        match command {
            ThermostatCommand::SetTemperature(temperature) => {
                self.set_temperature(temperature).await
            }
            ThermostatCommand::SetAwayMode(true) => self.turn_away_mode_on().await,
            ThermostatCommand::SetAwayMode(false) => self.turn_away_mode_off().await,
            ThermostatCommand::SetHvacMode(mode) => self.set_hvac_mode(&mode).await,
        }
    }
}
