use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use super::client::EcobeeClient;
use super::thermostat::Thermostat;
use super::Config as EcobeeConfig;
use crate::engine::Entity;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::ThermostatDevice;
use crate::engine::ThermostatState;
use crate::engine::ToIntegrationMessage;

/// Type alias for the shared thermostats map, keyed by entity id
type ThermostatsMap<C> = Arc<Mutex<BTreeMap<String, Arc<Mutex<Thermostat<C>>>>>>;

/// ecobee integration for hubd
///
/// Builds one thermostat entity per thermostat on the account, polls them on
/// the configured interval and applies commands routed by the engine.
pub struct EcobeeIntegration<C: EcobeeClient> {
    client: Arc<Mutex<C>>,
    config: EcobeeConfig,
    thermostats: ThermostatsMap<C>,
    to_engine: Option<FromIntegrationSender>,
    /// Handle to the background polling task
    poll_task: Option<JoinHandle<()>>,
}

impl<C: EcobeeClient + 'static> EcobeeIntegration<C> {
    /// Create a new ecobee integration
    pub fn new(client: C, config: &EcobeeConfig) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            config: config.clone(),
            thermostats: Arc::new(Mutex::new(BTreeMap::new())),
            to_engine: None,
            poll_task: None,
        }
    }

    /// Refresh every thermostat each scan interval and report its state
    async fn poll_thermostats(
        thermostats: ThermostatsMap<C>,
        interval: std::time::Duration,
        to_engine: FromIntegrationSender,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; setup has just fetched everything
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let entries: Vec<_> = thermostats.lock().await.values().cloned().collect();
            for thermostat in entries {
                let mut thermostat = thermostat.lock().await;
                if let Err(e) = thermostat.refresh().await {
                    warn!("Failed to refresh {}: {}", thermostat.entity_id(), e);
                    continue;
                }
                if !Self::report_state(&mut thermostat, &to_engine).await {
                    info!("Engine has gone away, stopping ecobee polling");
                    return;
                }
            }
        }
    }

    /// Report a thermostat's state to the engine
    ///
    /// Returns false if the engine is no longer listening.
    async fn report_state(
        thermostat: &mut Thermostat<C>,
        to_engine: &FromIntegrationSender,
    ) -> bool {
        let msg = FromIntegrationMessage::ThermostatStateChanged {
            entity_id: thermostat.entity_id().to_string(),
            state: ThermostatState::capture(thermostat),
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send ThermostatStateChanged message: {}", e);
            return false;
        }
        true
    }

    /// Register an entity with the engine
    async fn register_entity(entity_id: &str, to_engine: &FromIntegrationSender) {
        let msg = FromIntegrationMessage::EntityDiscovered {
            entity_id: entity_id.to_string(),
            integration_name: "ecobee".to_string(),
        };
        if let Err(e) = to_engine.send(msg).await {
            warn!("Failed to send EntityDiscovered message: {}", e);
        } else {
            info!("Registered entity: {}", entity_id);
        }
    }
}

#[async_trait]
impl<C: EcobeeClient + 'static> Integration for EcobeeIntegration<C> {
    fn name(&self) -> &str {
        "ecobee"
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        self.to_engine = Some(tx.clone());

        let count = {
            let mut client = self.client.lock().await;
            client
                .update()
                .await
                .map_err(|e| Box::new(e) as Box<dyn Error + Send>)?;
            client.thermostat_count()
        };

        info!(
            "Loading ecobee thermostat component with hold_temp set to {}",
            self.config.hold_temp
        );

        let mut entity_ids = Vec::with_capacity(count);
        for index in 0..count {
            let mut thermostat =
                Thermostat::new(self.client.clone(), index, self.config.hold_temp, &entity_ids)
                    .await
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send>)?;
            let entity_id = thermostat.entity_id().to_string();
            info!("Discovered thermostat {} ({})", thermostat.name(), entity_id);

            Self::register_entity(&entity_id, &tx).await;
            if !Self::report_state(&mut thermostat, &tx).await {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "engine stopped listening during ecobee setup",
                )));
            }

            self.thermostats
                .lock()
                .await
                .insert(entity_id.clone(), Arc::new(Mutex::new(thermostat)));
            entity_ids.push(entity_id);
        }

        let thermostats = self.thermostats.clone();
        let interval = self.config.scan_interval();
        self.poll_task = Some(tokio::spawn(async move {
            Self::poll_thermostats(thermostats, interval, tx).await;
        }));

        info!(
            "ecobee integration ready, polling {} thermostat(s) every {:?}",
            count, interval
        );
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            ToIntegrationMessage::ThermostatCommand { entity_id, command } => {
                let thermostat = self
                    .thermostats
                    .lock()
                    .await
                    .get(&entity_id)
                    .cloned()
                    .ok_or_else(|| -> Box<dyn Error + Send> {
                        Box::new(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("Thermostat not found: {}", entity_id),
                        ))
                    })?;

                let mut thermostat = thermostat.lock().await;
                thermostat.apply(command).await?;
                ThermostatDevice::update(&mut *thermostat).await?;

                if let Some(tx) = &self.to_engine {
                    Self::report_state(&mut thermostat, tx).await;
                }
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("ecobee integration shutting down");
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        Ok(())
    }
}
