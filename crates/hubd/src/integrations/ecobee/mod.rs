mod client;
mod config;
// Private module named after its integration
#[allow(clippy::module_inception)]
mod ecobee;
mod record;
mod thermostat;

pub use config::Config;
pub use ecobee::EcobeeIntegration;
use linkme::distributed_slice;

use crate::engine;

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_ecobee(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let ecobee_config = if let Some(c) = &ctx.config.integrations.ecobee {
        c
    } else {
        return Ok(None);
    };

    let client = client::SnapshotClient::new(&ecobee_config.snapshot);
    Ok(Some(Box::new(EcobeeIntegration::new(client, ecobee_config))))
}
