use std::collections::HashMap;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// Service port members listen on when none is configured.
pub const DEFAULT_SERVICE_PORT: u16 = 5701;

/// Discovery configuration handed down by the host framework.
///
/// The filter fields (`group`, `regions`, `tag_keys`, `tag_values`) are
/// consumed by the compute provider when it narrows the inventory; the
/// strategy itself only reads the service port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub regions: Vec<String>,
    pub tag_keys: Vec<String>,
    pub tag_values: Vec<String>,
    pub port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            provider: None,
            identity: None,
            credential: None,
            group: None,
            regions: Vec::new(),
            tag_keys: Vec::new(),
            tag_values: Vec::new(),
            port: DEFAULT_SERVICE_PORT,
        }
    }
}

impl DiscoveryConfig {
    /// Loads layered configuration: defaults, then `nimbus.toml`,
    /// `nimbus.json` and `NIMBUS_`-prefixed environment variables.
    pub fn load() -> Result<Self, DiscoveryError> {
        let mut config: DiscoveryConfig = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("nimbus.toml"))
            .merge(Json::file("nimbus.json"))
            .merge(Env::prefixed("NIMBUS_"))
            .extract()?;

        // Environment variables carry lists as comma-separated strings.
        config.regions = split_entries(config.regions);
        config.tag_keys = split_entries(config.tag_keys);
        config.tag_values = split_entries(config.tag_values);

        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from the property map the host framework
    /// passes to the plugin.  Unrecognized keys are ignored with a
    /// warning; recognized keys with unusable values fail.
    pub fn from_properties(
        properties: &HashMap<String, String>,
    ) -> Result<Self, DiscoveryError> {
        let mut config = Self::default();
        for (key, value) in properties {
            match key.as_str() {
                "provider" => config.provider = Some(value.clone()),
                "identity" => config.identity = Some(value.clone()),
                "credential" => config.credential = Some(value.clone()),
                "group" => config.group = Some(value.clone()),
                "regions" => config.regions = split_csv(value),
                "tag-keys" => config.tag_keys = split_csv(value),
                "tag-values" => config.tag_values = split_csv(value),
                "port" => {
                    config.port = value.trim().parse().map_err(|_| {
                        DiscoveryError::invalid_property(
                            "port",
                            format!("'{value}' is not a valid port number"),
                        )
                    })?;
                }
                other => warn!("Ignoring unrecognized discovery property '{}'", other),
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        // Tag values pair up with tag keys by position.
        if !self.tag_keys.is_empty()
            && !self.tag_values.is_empty()
            && self.tag_keys.len() != self.tag_values.len()
        {
            return Err(DiscoveryError::invalid_property(
                "tag-values",
                format!(
                    "{} tag values configured for {} tag keys",
                    self.tag_values.len(),
                    self.tag_keys.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Splits a comma-separated value, dropping empty segments.
fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Re-splits list entries that arrived as one comma-separated string.
fn split_entries(entries: Vec<String>) -> Vec<String> {
    entries.iter().flat_map(|entry| split_csv(entry)).collect()
}
