use tracing::error;

use super::config::Config;
use crate::engine::Entity;
use crate::util;

const DOMAIN: &str = "weblink";

/// A link to an external web page, shown as an entity whose state is its URL
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    entity_id: String,
    name: String,
    url: String,
    icon: Option<String>,
}

impl Link {
    /// Create a link; returns None if the name has nothing usable as an object id
    pub fn new(name: String, url: String, icon: Option<String>) -> Option<Self> {
        let object_id = util::slugify(&name);
        if object_id.is_empty() {
            return None;
        }

        Some(Self {
            entity_id: format!("{}.{}", DOMAIN, object_id),
            name,
            url,
            icon,
        })
    }
}

impl Entity for Link {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> &'static str {
        DOMAIN
    }

    fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn state(&self) -> String {
        self.url.clone()
    }
}

/// Build one link per valid configured entry, logging and skipping the rest
pub fn build_links(config: &Config) -> Vec<Link> {
    let mut links = Vec::with_capacity(config.entities.len());

    for entry in &config.entities {
        let (Some(name), Some(url)) = (&entry.name, &entry.url) else {
            error!("You need to set both name and url to add a {}", DOMAIN);
            continue;
        };

        match Link::new(name.clone(), url.clone(), entry.icon.clone()) {
            Some(link) => links.push(link),
            None => error!(
                "Cannot add {} '{}': the name has no characters usable in an entity id",
                DOMAIN, name
            ),
        }
    }

    links
}
