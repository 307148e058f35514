use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::IntegrationContext;
use super::integration::ToIntegrationSender;
use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use super::state::State;
use super::thermostat::ThermostatCommand;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No integration found for entity: {0}")]
    UnknownEntity(String),

    #[error("Integration channel not found or closed: {0}")]
    IntegrationUnavailable(String),

    #[error("Engine routing table is poisoned")]
    Poisoned,
}

/// hubd engine
///
/// This structure handles the flow of events, sending commands to the correct
/// integration, and maintaining a view of the world with State.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Map of entity_id -> integration name for routing messages
    entity_integration_map: std::sync::Mutex<HashMap<String, String>>,

    /// Communication channels to integrations (for commands)
    integration_channels: std::sync::Mutex<HashMap<String, ToIntegrationSender>>,

    /// Receive messages from integrations (events)
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report events back to the engine
    message_tx: FromIntegrationSender,

    /// Handles for integration tasks
    integration_handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        Self {
            state: ArcSwap::new(Arc::default()),
            entity_integration_map: std::sync::Mutex::new(HashMap::new()),
            integration_channels: std::sync::Mutex::new(HashMap::new()),
            message_rx: Mutex::new(message_rx),
            message_tx,
            integration_handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register integrations from configuration
    ///
    /// Every factory in the integration registry is offered the config; those
    /// whose section is present produce an integration, which is registered.
    pub fn register_integrations_from_config(&self, cfg: &crate::config::Config) {
        let ctx = IntegrationContext { config: cfg };
        for constr in super::integration::REGISTRY {
            let integration = match constr(&ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {:#}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, wires up channels,
    /// and starts its setup process.
    pub fn register_integration(&self, name: String, mut integration: Box<dyn Integration>) {
        let (to_integration_tx, mut to_integration_rx) = mpsc::unbounded_channel();
        let from_integration_tx = self.message_tx.clone();

        match self.integration_channels.lock() {
            Ok(mut channels) => {
                channels.insert(name.clone(), to_integration_tx);
            }
            Err(e) => {
                error!("Cannot register integration '{}': {}", name, e);
                return;
            }
        }

        info!("Registering integration '{}'", name);

        // Spawn integration task
        let handle = tokio::spawn(async move {
            // Setup integration (gives it the sender for events)
            if let Err(e) = integration.setup(from_integration_tx).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            // Process commands from engine
            while let Some(msg) = to_integration_rx.recv().await {
                if let Err(e) = integration.handle_message(msg).await {
                    warn!("Integration '{}' failed to handle message: {}", name, e);
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        if let Ok(mut handles) = self.integration_handles.lock() {
            handles.push(handle);
        }
    }

    /// Send a command to an integration
    ///
    /// Routes the command to the appropriate integration based on entity_id.
    pub fn send_command(&self, msg: ToIntegrationMessage) -> Result<(), EngineError> {
        let integration_name = {
            let map = self
                .entity_integration_map
                .lock()
                .map_err(|_| EngineError::Poisoned)?;
            map.get(msg.entity_id())
                .cloned()
                .ok_or_else(|| EngineError::UnknownEntity(msg.entity_id().to_string()))?
        };

        let channels = self
            .integration_channels
            .lock()
            .map_err(|_| EngineError::Poisoned)?;
        let tx = channels
            .get(&integration_name)
            .ok_or_else(|| EngineError::IntegrationUnavailable(integration_name.clone()))?;

        tx.send(msg)
            .map_err(|_| EngineError::IntegrationUnavailable(integration_name))
    }

    /// Send a command to a thermostat entity
    pub fn send_thermostat_command(
        &self,
        entity_id: String,
        command: ThermostatCommand,
    ) -> Result<(), EngineError> {
        info!("Thermostat command for {}: {:?}", entity_id, command);
        self.send_command(ToIntegrationMessage::ThermostatCommand { entity_id, command })
    }

    /// Run the engine's main event loop
    ///
    /// Processes incoming events from integrations and updates state.
    pub async fn run(&self) {
        info!("Engine starting");

        let mut rx = self.message_rx.lock().await;
        while let Some(msg) = rx.recv().await {
            self.handle_event(msg);
        }

        info!("Engine shutting down");
    }

    /// Stop every integration and wait for its task to finish
    ///
    /// Dropping the command channels ends each integration's command loop,
    /// after which the integration's `shutdown` runs.
    pub async fn shutdown(&self) {
        if let Ok(mut channels) = self.integration_channels.lock() {
            channels.clear();
        }

        let handles = match self.integration_handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => Vec::new(),
        };

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Integration task ended abnormally: {}", e);
            }
        }
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    fn update_state(&self, f: impl FnOnce(&mut State)) {
        let mut state = State::clone(&self.state.load());
        f(&mut state);
        self.state.store(Arc::new(state));
    }

    /// Handle an event from an integration
    pub(crate) fn handle_event(&self, msg: FromIntegrationMessage) {
        match msg {
            FromIntegrationMessage::EntityDiscovered {
                entity_id,
                integration_name,
            } => {
                info!(
                    "Entity discovered: {} (from {})",
                    entity_id, integration_name
                );

                // State is not populated until the first state-change message arrives.
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    if let Some(previous) = map.insert(entity_id.clone(), integration_name) {
                        warn!(
                            "Entity {} was already registered by {}, replacing",
                            entity_id, previous
                        );
                    }
                }
            }
            FromIntegrationMessage::EntityRemoved { entity_id } => {
                info!("Entity removed: {}", entity_id);

                self.update_state(|state| {
                    state.thermostats.remove(&entity_id);
                    state.links.remove(&entity_id);
                });

                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.remove(&entity_id);
                }
            }
            FromIntegrationMessage::ThermostatStateChanged { entity_id, state } => {
                info!(
                    "Thermostat state changed: {} -> {} (operation={:?}, away={:?})",
                    entity_id, state.state, state.operation, state.away_mode
                );
                self.update_state(|s| {
                    s.thermostats.insert(entity_id, state);
                });
            }
            FromIntegrationMessage::LinkStateChanged { entity_id, state } => {
                info!("Link state changed: {} -> {}", entity_id, state.state);
                self.update_state(|s| {
                    s.links.insert(entity_id, state);
                });
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
