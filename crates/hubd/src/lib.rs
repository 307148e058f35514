pub mod api;
pub mod config;
mod engine;
mod integrations;
pub mod util;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::FanState;
pub use engine::LinkState;
pub use engine::Operation;
pub use engine::State;
pub use engine::TemperatureUnit;
pub use engine::ThermostatCommand;
pub use engine::ThermostatState;
pub use integrations::EcobeeConfig;
pub use integrations::LinkConfig;
pub use integrations::WeblinkConfig;
