// Private module named after its parent
#[allow(clippy::module_inception)]
mod engine;
mod entity;
mod integration;
mod message;
pub mod state;
mod thermostat;

pub use engine::Engine;
pub use engine::EngineError;
pub use entity::Entity;
pub use integration::FromIntegrationSender;
pub use integration::Integration;
pub use integration::IntegrationContext;
pub use integration::IntegrationFactoryResult;
pub use integration::REGISTRY as INTEGRATION_REGISTRY;
pub use message::FromIntegrationMessage;
pub use message::ToIntegrationMessage;
pub use state::LinkState;
pub use state::State;
pub use state::ThermostatState;
pub use thermostat::FanState;
pub use thermostat::Operation;
pub use thermostat::TemperatureUnit;
pub use thermostat::ThermostatCommand;
pub use thermostat::ThermostatDevice;
