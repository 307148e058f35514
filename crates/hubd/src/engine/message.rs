//! Type-safe message system for hubd
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use super::state::LinkState;
use super::state::ThermostatState;
use super::thermostat::ThermostatCommand;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug, Clone)]
pub enum FromIntegrationMessage {
    /// An entity was discovered and registered
    EntityDiscovered {
        entity_id: String,
        integration_name: String,
    },

    /// An entity was removed
    EntityRemoved { entity_id: String },

    /// A thermostat was polled or commanded
    ThermostatStateChanged {
        entity_id: String,
        state: ThermostatState,
    },

    /// A link was registered
    LinkStateChanged { entity_id: String, state: LinkState },
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug, Clone)]
pub enum ToIntegrationMessage {
    ThermostatCommand {
        entity_id: String,
        command: ThermostatCommand,
    },
}

impl ToIntegrationMessage {
    /// The entity this command is addressed to
    pub fn entity_id(&self) -> &str {
        match self {
            ToIntegrationMessage::ThermostatCommand { entity_id, .. } => entity_id,
        }
    }
}
