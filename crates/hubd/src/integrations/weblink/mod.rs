mod config;
mod link;
// Private module named after its integration
#[allow(clippy::module_inception)]
mod weblink;

pub use config::Config;
pub use config::LinkConfig;
use linkme::distributed_slice;
pub use weblink::WeblinkIntegration;

use crate::engine;

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_weblink(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let weblink_config = if let Some(c) = &ctx.config.integrations.weblink {
        c
    } else {
        return Ok(None);
    };

    Ok(Some(Box::new(WeblinkIntegration::new(weblink_config))))
}
