use serde::Deserialize;

/// Configuration for the weblink integration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Links to show; entries without both a name and a url are skipped
    #[serde(default)]
    pub entities: Vec<LinkConfig>,
}

/// One configured link
///
/// `name` and `url` are required, but are optional here so one bad entry is
/// reported and skipped instead of rejecting the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkConfig {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}
