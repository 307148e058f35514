use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;

use super::client::EcobeeClient;
use super::client::EcobeeError;
use super::client::HoldType;
use super::record::ThermostatRecord;
use crate::engine::Entity;
use crate::engine::FanState;
use crate::engine::Operation;
use crate::engine::TemperatureUnit;
use crate::engine::ThermostatDevice;
use crate::util;

/// Climate held while away mode is on
const AWAY_CLIMATE: &str = "away";

/// One ecobee thermostat, addressed by its index in the client's list.
///
/// Every property is derived from the record fetched on the last refresh,
/// except the away flag: commands set it immediately and it only follows the
/// record again when `mode` is read.
pub struct Thermostat<C: EcobeeClient> {
    client: Arc<Mutex<C>>,
    index: usize,
    entity_id: String,
    thermostat: ThermostatRecord,
    away: bool,

    /// Hold indefinitely rather than until the next scheduled event
    hold_temp: bool,
}

fn boxed(e: EcobeeError) -> Box<dyn Error + Send> {
    Box::new(e)
}

impl<C: EcobeeClient> Thermostat<C> {
    /// Fetch the record at `index` and build the adapter around it.
    ///
    /// The entity id is derived from the thermostat's name and made unique
    /// against `existing`.
    pub async fn new(
        client: Arc<Mutex<C>>,
        index: usize,
        hold_temp: bool,
        existing: &[String],
    ) -> Result<Self, EcobeeError> {
        let thermostat = client.lock().await.get_thermostat(index)?;

        let entity_id = util::generate_entity_id("thermostat", &thermostat.name, existing)
            .unwrap_or_else(|| {
                util::ensure_unique_string(&format!("thermostat.ecobee_{}", index), existing)
            });
        let away = thermostat
            .program
            .current_climate_ref
            .contains(AWAY_CLIMATE);

        Ok(Self {
            client,
            index,
            entity_id,
            thermostat,
            away,
            hold_temp,
        })
    }

    /// Refresh the client, then re-fetch this thermostat's record
    pub async fn refresh(&mut self) -> Result<(), EcobeeError> {
        let mut client = self.client.lock().await;
        client.update().await?;
        self.thermostat = client.get_thermostat(self.index)?;

        debug!(
            "{}: {} at {}, equipment [{}], fan mode {}",
            self.entity_id,
            self.thermostat.settings.hvac_mode,
            self.thermostat.runtime.actual_temperature,
            self.thermostat.equipment_status,
            self.desired_fan_mode()
        );
        Ok(())
    }

    pub fn desired_fan_mode(&self) -> &str {
        &self.thermostat.runtime.desired_fan_mode
    }

    fn hold(&self) -> HoldType {
        HoldType::from_hold_temp(self.hold_temp)
    }

    fn low(&self) -> f64 {
        (self.thermostat.runtime.desired_heat / 10) as f64
    }

    fn high(&self) -> f64 {
        (self.thermostat.runtime.desired_cool / 10) as f64
    }
}

impl<C: EcobeeClient> Entity for Thermostat<C> {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.thermostat.name
    }

    fn platform(&self) -> &'static str {
        "thermostat"
    }

    fn state(&self) -> String {
        self.target_temperature()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[async_trait]
impl<C: EcobeeClient> ThermostatDevice for Thermostat<C> {
    fn unit_of_measurement(&self) -> TemperatureUnit {
        TemperatureUnit::Fahrenheit
    }

    fn current_temperature(&self) -> Option<f64> {
        Some(self.thermostat.runtime.actual_temperature as f64 / 10.0)
    }

    fn target_temperature(&self) -> Option<f64> {
        let target = match self.thermostat.settings.hvac_mode.as_str() {
            "heat" | "auxHeatOnly" => self.low(),
            "cool" => self.high(),
            // auto straddles both setpoints
            _ => (self.low() + self.high()) / 2.0,
        };
        Some(target)
    }

    fn target_temperature_low(&self) -> Option<f64> {
        Some(self.low())
    }

    fn target_temperature_high(&self) -> Option<f64> {
        Some(self.high())
    }

    fn humidity(&self) -> Option<f64> {
        Some(self.thermostat.runtime.actual_humidity as f64)
    }

    fn fan(&self) -> Option<FanState> {
        if self.thermostat.equipment_status.contains("fan") {
            Some(FanState::On)
        } else {
            Some(FanState::Off)
        }
    }

    fn operation(&self) -> Option<Operation> {
        let status = &self.thermostat.equipment_status;
        let operation = if status.is_empty() {
            Operation::Idle
        } else if status.contains("Cool") {
            Operation::Cool
        } else if status.contains("auxHeat") || status.contains("heatPump") {
            Operation::Heat
        } else {
            Operation::Other(status.clone())
        };
        Some(operation)
    }

    fn mode(&mut self) -> Option<String> {
        let mode = self.thermostat.program.current_climate_ref.clone();
        self.away = mode.contains(AWAY_CLIMATE);
        Some(mode)
    }

    fn hvac_mode(&self) -> Option<String> {
        Some(self.thermostat.settings.hvac_mode.clone())
    }

    fn is_away_mode_on(&self) -> Option<bool> {
        Some(self.away)
    }

    fn device_state_attributes(&mut self) -> serde_json::Map<String, serde_json::Value> {
        let mut attributes = serde_json::Map::new();
        attributes.insert("humidity".into(), json!(self.humidity()));
        attributes.insert("fan".into(), json!(self.fan()));
        attributes.insert("mode".into(), json!(self.mode()));
        attributes.insert("hvac_mode".into(), json!(self.hvac_mode()));
        attributes
    }

    async fn update(&mut self) -> Result<(), Box<dyn Error + Send>> {
        self.refresh().await.map_err(boxed)
    }

    async fn set_temperature(&mut self, temperature: f64) -> Result<(), Box<dyn Error + Send>> {
        // The vendor wants both setpoints, so hold a one degree band either side
        let out_of_range = || boxed(EcobeeError::SetpointOutOfRange(temperature));
        if !temperature.is_finite() {
            return Err(out_of_range());
        }
        let setpoint = temperature.trunc() as i64;
        let low = setpoint.checked_sub(1).ok_or_else(out_of_range)?;
        let high = setpoint.checked_add(1).ok_or_else(out_of_range)?;
        info!("{}: holding {}..{}", self.entity_id, low, high);

        let hold = self.hold();
        self.client
            .lock()
            .await
            .set_hold_temp(self.index, low, high, hold)
            .await
            .map_err(boxed)
    }

    async fn turn_away_mode_on(&mut self) -> Result<(), Box<dyn Error + Send>> {
        self.away = true;
        info!("{}: away mode on", self.entity_id);

        let hold = self.hold();
        self.client
            .lock()
            .await
            .set_climate_hold(self.index, AWAY_CLIMATE, hold)
            .await
            .map_err(boxed)
    }

    async fn turn_away_mode_off(&mut self) -> Result<(), Box<dyn Error + Send>> {
        self.away = false;
        info!("{}: away mode off", self.entity_id);

        self.client
            .lock()
            .await
            .resume_program(self.index)
            .await
            .map_err(boxed)
    }

    async fn set_hvac_mode(&mut self, mode: &str) -> Result<(), Box<dyn Error + Send>> {
        info!("{}: hvac mode {}", self.entity_id, mode);
        self.client
            .lock()
            .await
            .set_hvac_mode(self.index, mode)
            .await
            .map_err(boxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ThermostatCommand;
    use crate::engine::ThermostatState;
    use crate::integrations::ecobee::client::ClientCall;
    use crate::integrations::ecobee::client::MockEcobeeClient;
    use crate::integrations::ecobee::record::fixtures::record;

    async fn thermostat_with(
        record: ThermostatRecord,
        hold_temp: bool,
    ) -> (Thermostat<MockEcobeeClient>, Arc<Mutex<MockEcobeeClient>>) {
        let client = Arc::new(Mutex::new(MockEcobeeClient::new(vec![record])));
        let thermostat = Thermostat::new(client.clone(), 0, hold_temp, &[])
            .await
            .unwrap();
        (thermostat, client)
    }

    fn with_status(status: &str) -> ThermostatRecord {
        record("Main Floor", "auto", status)
    }

    #[tokio::test]
    async fn test_identity() {
        let (thermostat, _) = thermostat_with(with_status(""), false).await;
        assert_eq!(thermostat.entity_id(), "thermostat.main_floor");
        assert_eq!(thermostat.name(), "Main Floor");
        assert_eq!(thermostat.platform(), "thermostat");
        assert_eq!(
            thermostat.unit_of_measurement(),
            TemperatureUnit::Fahrenheit
        );
    }

    #[tokio::test]
    async fn test_temperatures() {
        let (thermostat, _) = thermostat_with(with_status(""), false).await;
        assert_eq!(thermostat.current_temperature(), Some(71.2));
        assert_eq!(thermostat.target_temperature_low(), Some(69.0));
        // 755 truncates to 75
        assert_eq!(thermostat.target_temperature_high(), Some(75.0));
        assert_eq!(thermostat.humidity(), Some(41.0));
        assert_eq!(thermostat.desired_fan_mode(), "auto");
    }

    #[tokio::test]
    async fn test_target_temperature_follows_hvac_mode() {
        for (hvac_mode, expected) in [
            ("heat", 69.0),
            ("auxHeatOnly", 69.0),
            ("cool", 75.0),
            ("auto", 72.0),
            ("off", 72.0),
        ] {
            let (thermostat, _) =
                thermostat_with(record("Main Floor", hvac_mode, ""), false).await;
            assert_eq!(
                thermostat.target_temperature(),
                Some(expected),
                "hvac mode {}",
                hvac_mode
            );
            assert_eq!(thermostat.hvac_mode().as_deref(), Some(hvac_mode));
        }
    }

    #[tokio::test]
    async fn test_midpoint_keeps_fraction() {
        let mut record = with_status("");
        record.runtime.desired_heat = 680;
        record.runtime.desired_cool = 750;
        let (thermostat, _) = thermostat_with(record, false).await;
        assert_eq!(thermostat.target_temperature(), Some(71.5));
        assert_eq!(thermostat.state(), "71.5");
    }

    #[tokio::test]
    async fn test_operation_mapping() {
        for (status, expected) in [
            ("", Operation::Idle),
            ("compCool1", Operation::Cool),
            ("compCool2,fan", Operation::Cool),
            ("auxHeat1", Operation::Heat),
            ("heatPump,fan", Operation::Heat),
            ("fan", Operation::Other("fan".to_string())),
            ("ventilator", Operation::Other("ventilator".to_string())),
        ] {
            let (thermostat, _) = thermostat_with(with_status(status), false).await;
            assert_eq!(thermostat.operation(), Some(expected), "status {:?}", status);
        }
    }

    #[tokio::test]
    async fn test_fan_state() {
        let (running, _) = thermostat_with(with_status("heatPump,fan"), false).await;
        assert_eq!(running.fan(), Some(FanState::On));

        let (idle, _) = thermostat_with(with_status("heatPump"), false).await;
        assert_eq!(idle.fan(), Some(FanState::Off));
    }

    #[tokio::test]
    async fn test_set_temperature_holds_band() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;
        thermostat.set_temperature(70.0).await.unwrap();
        thermostat.set_temperature(70.9).await.unwrap();

        let expected = ClientCall::SetHoldTemp {
            index: 0,
            low: 69,
            high: 71,
            hold: HoldType::NextTransition,
        };
        assert_eq!(client.lock().await.calls, vec![expected.clone(), expected]);
    }

    #[tokio::test]
    async fn test_set_temperature_rejects_unrepresentable_values() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;

        for temperature in [1e300, -1e300, f64::NAN, f64::INFINITY] {
            let err = thermostat.set_temperature(temperature).await.unwrap_err();
            assert!(err.to_string().starts_with("Setpoint out of range"));
        }
        assert!(client.lock().await.calls.is_empty());

        // The adapter is still usable afterwards
        thermostat.set_temperature(70.0).await.unwrap();
        assert_eq!(client.lock().await.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_hold_temp_makes_holds_indefinite() {
        let (mut thermostat, client) = thermostat_with(with_status(""), true).await;
        thermostat.set_temperature(68.0).await.unwrap();
        thermostat.turn_away_mode_on().await.unwrap();

        assert_eq!(
            client.lock().await.calls,
            vec![
                ClientCall::SetHoldTemp {
                    index: 0,
                    low: 67,
                    high: 69,
                    hold: HoldType::Indefinite,
                },
                ClientCall::SetClimateHold {
                    index: 0,
                    climate: "away".to_string(),
                    hold: HoldType::Indefinite,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_away_flag_is_local_until_mode_is_read() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;
        assert_eq!(thermostat.is_away_mode_on(), Some(false));

        thermostat.turn_away_mode_on().await.unwrap();
        // The record still says "home"; the local flag wins
        assert_eq!(thermostat.is_away_mode_on(), Some(true));
        assert_eq!(
            client.lock().await.calls,
            vec![ClientCall::SetClimateHold {
                index: 0,
                climate: "away".to_string(),
                hold: HoldType::NextTransition,
            }]
        );

        assert_eq!(thermostat.mode().as_deref(), Some("home"));
        assert_eq!(thermostat.is_away_mode_on(), Some(false));
    }

    #[tokio::test]
    async fn test_turn_away_mode_off_resumes_program() {
        let mut record = with_status("");
        record.program.current_climate_ref = "away".to_string();
        let (mut thermostat, client) = thermostat_with(record, false).await;
        assert_eq!(thermostat.is_away_mode_on(), Some(true));

        thermostat.turn_away_mode_off().await.unwrap();
        assert_eq!(thermostat.is_away_mode_on(), Some(false));
        assert_eq!(
            client.lock().await.calls,
            vec![ClientCall::ResumeProgram { index: 0 }]
        );
    }

    #[tokio::test]
    async fn test_set_hvac_mode_passes_through() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;
        thermostat
            .apply(ThermostatCommand::SetHvacMode("bogus".to_string()))
            .await
            .unwrap();
        assert_eq!(
            client.lock().await.calls,
            vec![ClientCall::SetHvacMode {
                index: 0,
                mode: "bogus".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_refresh_fetches_new_record() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;
        {
            let mut client = client.lock().await;
            client.thermostats[0].runtime.actual_temperature = 655;
            client.thermostats[0].equipment_status = "compCool1".to_string();
        }

        // Nothing changes until the next refresh
        assert_eq!(thermostat.current_temperature(), Some(71.2));

        thermostat.refresh().await.unwrap();
        assert_eq!(thermostat.current_temperature(), Some(65.5));
        assert_eq!(thermostat.operation(), Some(Operation::Cool));
        assert_eq!(client.lock().await.calls, vec![ClientCall::Update]);
    }

    #[tokio::test]
    async fn test_refresh_propagates_client_failure() {
        let (mut thermostat, client) = thermostat_with(with_status(""), false).await;
        {
            let mut client = client.lock().await;
            client.fail_update = true;
            client.thermostats[0].runtime.actual_temperature = 655;
        }

        let err = thermostat.refresh().await.unwrap_err();
        assert!(matches!(err, EcobeeError::Io(..)));
        assert_eq!(thermostat.current_temperature(), Some(71.2));
    }

    #[tokio::test]
    async fn test_unknown_index() {
        let client = Arc::new(Mutex::new(MockEcobeeClient::new(vec![with_status("")])));
        let err = Thermostat::new(client, 3, false, &[]).await.err().unwrap();
        assert!(matches!(err, EcobeeError::UnknownThermostat(3)));
    }

    #[tokio::test]
    async fn test_duplicate_names_get_unique_ids() {
        let client = Arc::new(Mutex::new(MockEcobeeClient::new(vec![
            with_status(""),
            with_status(""),
        ])));
        let first = Thermostat::new(client.clone(), 0, false, &[]).await.unwrap();
        let second = Thermostat::new(client, 1, false, &[first.entity_id().to_string()])
            .await
            .unwrap();
        assert_eq!(second.entity_id(), "thermostat.main_floor_2");
    }

    #[tokio::test]
    async fn test_capture_reports_away_before_reconciling() {
        let (mut thermostat, _) = thermostat_with(with_status("heatPump,fan"), false).await;
        thermostat.turn_away_mode_on().await.unwrap();

        let state = ThermostatState::capture(&mut thermostat);
        assert_eq!(state.name, "Main Floor");
        assert_eq!(state.state, "72");
        assert_eq!(state.away_mode, Some(true));
        assert_eq!(state.operation, Some(Operation::Heat));
        assert_eq!(state.fan, Some(FanState::On));
        assert_eq!(state.temperature, Some(72.0));
        assert_eq!(state.attributes["mode"], "home");
        assert_eq!(state.attributes["hvac_mode"], "auto");
        assert_eq!(state.attributes["fan"], "on");
        assert_eq!(state.attributes["humidity"], 41.0);

        // Reading the attributes reconciled the flag with the record
        let state = ThermostatState::capture(&mut thermostat);
        assert_eq!(state.away_mode, Some(false));
    }
}
