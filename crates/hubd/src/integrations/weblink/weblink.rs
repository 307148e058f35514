use std::error::Error;

use async_trait::async_trait;
use tracing::info;
use tracing::warn;

use super::link::build_links;
use super::link::Link;
use super::Config as WeblinkConfig;
use crate::engine::Entity;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::LinkState;
use crate::engine::ToIntegrationMessage;

/// weblink integration for hubd
///
/// Registers the configured links once at setup. Links never change and
/// accept no commands.
pub struct WeblinkIntegration {
    config: WeblinkConfig,
    links: Vec<Link>,
}

impl WeblinkIntegration {
    pub fn new(config: &WeblinkConfig) -> Self {
        Self {
            config: config.clone(),
            links: Vec::new(),
        }
    }
}

#[async_trait]
impl Integration for WeblinkIntegration {
    fn name(&self) -> &str {
        "weblink"
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        self.links = build_links(&self.config);

        for link in &self.links {
            let entity_id = link.entity_id().to_string();
            let discovered = FromIntegrationMessage::EntityDiscovered {
                entity_id: entity_id.clone(),
                integration_name: "weblink".to_string(),
            };
            let state = FromIntegrationMessage::LinkStateChanged {
                entity_id: entity_id.clone(),
                state: LinkState::capture(link),
            };

            for msg in [discovered, state] {
                tx.send(msg)
                    .await
                    .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?;
            }
            info!("Registered link {} -> {}", entity_id, link.state());
        }

        info!(
            "weblink integration set up with {} of {} configured link(s)",
            self.links.len(),
            self.config.entities.len()
        );
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        warn!("weblink entities accept no commands, ignoring {:?}", msg);
        Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("{} is a link and accepts no commands", msg.entity_id()),
        )))
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("weblink integration shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ThermostatCommand;
    use crate::integrations::weblink::LinkConfig;
    use crate::util::log_capture::LogBuffer;

    fn config() -> WeblinkConfig {
        WeblinkConfig {
            entities: vec![
                LinkConfig {
                    name: Some("Router".to_string()),
                    url: Some("http://10.0.0.1".to_string()),
                    icon: Some("mdi:router-wireless".to_string()),
                },
                LinkConfig {
                    name: Some("Bad".to_string()),
                    url: None,
                    icon: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_setup_registers_valid_links() {
        let mut integration = WeblinkIntegration::new(&config());
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);

        let logs = LogBuffer::default();
        {
            let _guard = tracing::subscriber::set_default(logs.subscriber());
            integration.setup(tx).await.unwrap();
        }

        // Only the entry without a url is reported
        let errors = logs.lines_at(tracing::Level::ERROR);
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].contains("name") && errors[0].contains("url"));

        match rx.recv().await.unwrap() {
            FromIntegrationMessage::EntityDiscovered {
                entity_id,
                integration_name,
            } => {
                assert_eq!(entity_id, "weblink.router");
                assert_eq!(integration_name, "weblink");
            }
            other => panic!("expected EntityDiscovered, got {:?}", other),
        }

        match rx.recv().await.unwrap() {
            FromIntegrationMessage::LinkStateChanged { entity_id, state } => {
                assert_eq!(entity_id, "weblink.router");
                insta::assert_json_snapshot!(state, @r###"
                {
                  "name": "Router",
                  "state": "http://10.0.0.1",
                  "icon": "mdi:router-wireless"
                }
                "###);
            }
            other => panic!("expected LinkStateChanged, got {:?}", other),
        }

        // "Bad" produced nothing; the sender is gone once setup returns
        drop(integration);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_links_reject_commands() {
        let mut integration = WeblinkIntegration::new(&config());
        let result = integration
            .handle_message(ToIntegrationMessage::ThermostatCommand {
                entity_id: "weblink.router".to_string(),
                command: ThermostatCommand::SetAwayMode(true),
            })
            .await;
        assert!(result.is_err());
    }
}
