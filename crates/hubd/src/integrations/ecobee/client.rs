use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;

use super::record::ThermostatList;
use super::record::ThermostatRecord;

/// How long a hold stays in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum HoldType {
    /// Until the next scheduled program event
    NextTransition,
    /// Until explicitly resumed
    Indefinite,
}

impl HoldType {
    /// Map the `hold_temp` configuration flag to a hold type
    pub fn from_hold_temp(hold_temp: bool) -> Self {
        if hold_temp {
            HoldType::Indefinite
        } else {
            HoldType::NextTransition
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EcobeeError {
    #[error("No thermostat at index {0}")]
    UnknownThermostat(usize),

    #[error("Failed to access thermostat document {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid thermostat document {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Setpoint out of range: {0}")]
    SetpointOutOfRange(f64),
}

/// Trait for ecobee client operations
///
/// The client owns authentication, transport and rate limiting; thermostats
/// are addressed by their index in the client's thermostat list.
#[async_trait]
pub trait EcobeeClient: Send + Sync {
    /// Number of thermostats on the account
    fn thermostat_count(&self) -> usize;

    /// Refresh all thermostat records
    async fn update(&mut self) -> Result<(), EcobeeError>;

    /// Latest record for one thermostat
    fn get_thermostat(&self, index: usize) -> Result<ThermostatRecord, EcobeeError>;

    /// Hold the setpoints at `low`..`high` whole degrees Fahrenheit
    async fn set_hold_temp(
        &mut self,
        index: usize,
        low: i64,
        high: i64,
        hold: HoldType,
    ) -> Result<(), EcobeeError>;

    /// Hold a named comfort profile, e.g. "away"
    async fn set_climate_hold(
        &mut self,
        index: usize,
        climate: &str,
        hold: HoldType,
    ) -> Result<(), EcobeeError>;

    /// Cancel any hold and return to the schedule
    async fn resume_program(&mut self, index: usize) -> Result<(), EcobeeError>;

    async fn set_hvac_mode(&mut self, index: usize, mode: &str) -> Result<(), EcobeeError>;
}

/// Client backed by a JSON document in the vendor's thermostat summary shape.
///
/// `update` re-reads the document. Commands are applied to the in-memory
/// records the way the vendor applies them and written back, so the next
/// `update` sees them.
pub struct SnapshotClient {
    path: PathBuf,
    document: ThermostatList,

    /// Climate each thermostat was running when first seen; restored on resume
    scheduled_climates: Vec<String>,
}

impl SnapshotClient {
    /// Client for the document at `path`; nothing is read until `update`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: ThermostatList::default(),
            scheduled_climates: Vec::new(),
        }
    }

    async fn read(path: &Path) -> Result<ThermostatList, EcobeeError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EcobeeError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&contents).map_err(|e| EcobeeError::Json(path.to_path_buf(), e))
    }

    async fn write(&self) -> Result<(), EcobeeError> {
        let contents = serde_json::to_vec_pretty(&self.document)
            .map_err(|e| EcobeeError::Json(self.path.clone(), e))?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| EcobeeError::Io(self.path.clone(), e))
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut ThermostatRecord, EcobeeError> {
        self.document
            .thermostat_list
            .get_mut(index)
            .ok_or(EcobeeError::UnknownThermostat(index))
    }
}

#[async_trait]
impl EcobeeClient for SnapshotClient {
    fn thermostat_count(&self) -> usize {
        self.document.thermostat_list.len()
    }

    async fn update(&mut self) -> Result<(), EcobeeError> {
        debug!("Reloading thermostat document {}", self.path.display());
        self.document = Self::read(&self.path).await?;

        // Thermostats not seen before are running their scheduled program
        let known = self.scheduled_climates.len();
        self.scheduled_climates.extend(
            self.document
                .thermostat_list
                .iter()
                .skip(known)
                .map(|t| t.program.current_climate_ref.clone()),
        );

        if known == 0 {
            info!(
                "Loaded {} thermostat(s) from {}",
                self.document.thermostat_list.len(),
                self.path.display()
            );
        }
        Ok(())
    }

    fn get_thermostat(&self, index: usize) -> Result<ThermostatRecord, EcobeeError> {
        self.document
            .thermostat_list
            .get(index)
            .cloned()
            .ok_or(EcobeeError::UnknownThermostat(index))
    }

    async fn set_hold_temp(
        &mut self,
        index: usize,
        low: i64,
        high: i64,
        hold: HoldType,
    ) -> Result<(), EcobeeError> {
        info!("Thermostat {}: hold {}..{} ({})", index, low, high, hold);
        let tenths = |degrees: i64| {
            degrees
                .checked_mul(10)
                .ok_or(EcobeeError::SetpointOutOfRange(degrees as f64))
        };
        let (heat, cool) = (tenths(low)?, tenths(high)?);

        let record = self.record_mut(index)?;
        record.runtime.desired_heat = heat;
        record.runtime.desired_cool = cool;
        self.write().await
    }

    async fn set_climate_hold(
        &mut self,
        index: usize,
        climate: &str,
        hold: HoldType,
    ) -> Result<(), EcobeeError> {
        info!("Thermostat {}: hold climate {} ({})", index, climate, hold);
        let record = self.record_mut(index)?;
        record.program.current_climate_ref = climate.to_string();
        self.write().await
    }

    async fn resume_program(&mut self, index: usize) -> Result<(), EcobeeError> {
        info!("Thermostat {}: resume program", index);
        let scheduled = self.scheduled_climates.get(index).cloned();
        let record = self.record_mut(index)?;
        if let Some(climate) = scheduled {
            record.program.current_climate_ref = climate;
        }
        self.write().await
    }

    async fn set_hvac_mode(&mut self, index: usize, mode: &str) -> Result<(), EcobeeError> {
        info!("Thermostat {}: hvac mode {}", index, mode);
        let record = self.record_mut(index)?;
        record.settings.hvac_mode = mode.to_string();
        self.write().await
    }
}

/// A call made against the mock client
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Update,
    SetHoldTemp {
        index: usize,
        low: i64,
        high: i64,
        hold: HoldType,
    },
    SetClimateHold {
        index: usize,
        climate: String,
        hold: HoldType,
    },
    ResumeProgram {
        index: usize,
    },
    SetHvacMode {
        index: usize,
        mode: String,
    },
}

/// Mock ecobee client for testing
///
/// Records every call and never changes its records on commands.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockEcobeeClient {
    pub thermostats: Vec<ThermostatRecord>,
    pub calls: Vec<ClientCall>,
    pub fail_update: bool,
}

#[cfg(test)]
impl MockEcobeeClient {
    pub fn new(thermostats: Vec<ThermostatRecord>) -> Self {
        Self {
            thermostats,
            ..Self::default()
        }
    }

    fn check_index(&self, index: usize) -> Result<(), EcobeeError> {
        if index < self.thermostats.len() {
            Ok(())
        } else {
            Err(EcobeeError::UnknownThermostat(index))
        }
    }
}

#[cfg(test)]
#[async_trait]
impl EcobeeClient for MockEcobeeClient {
    fn thermostat_count(&self) -> usize {
        self.thermostats.len()
    }

    async fn update(&mut self) -> Result<(), EcobeeError> {
        self.calls.push(ClientCall::Update);
        if self.fail_update {
            return Err(EcobeeError::Io(
                PathBuf::from("mock"),
                std::io::Error::other("connection reset"),
            ));
        }
        Ok(())
    }

    fn get_thermostat(&self, index: usize) -> Result<ThermostatRecord, EcobeeError> {
        self.thermostats
            .get(index)
            .cloned()
            .ok_or(EcobeeError::UnknownThermostat(index))
    }

    async fn set_hold_temp(
        &mut self,
        index: usize,
        low: i64,
        high: i64,
        hold: HoldType,
    ) -> Result<(), EcobeeError> {
        self.check_index(index)?;
        self.calls.push(ClientCall::SetHoldTemp {
            index,
            low,
            high,
            hold,
        });
        Ok(())
    }

    async fn set_climate_hold(
        &mut self,
        index: usize,
        climate: &str,
        hold: HoldType,
    ) -> Result<(), EcobeeError> {
        self.check_index(index)?;
        self.calls.push(ClientCall::SetClimateHold {
            index,
            climate: climate.to_string(),
            hold,
        });
        Ok(())
    }

    async fn resume_program(&mut self, index: usize) -> Result<(), EcobeeError> {
        self.check_index(index)?;
        self.calls.push(ClientCall::ResumeProgram { index });
        Ok(())
    }

    async fn set_hvac_mode(&mut self, index: usize, mode: &str) -> Result<(), EcobeeError> {
        self.check_index(index)?;
        self.calls.push(ClientCall::SetHvacMode {
            index,
            mode: mode.to_string(),
        });
        Ok(())
    }
}
