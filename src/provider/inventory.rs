//! In-memory compute provider.
//!
//! Serves a fixed set of node records through the [`ComputeProvider`]
//! boundary, applying the same group/region/tag narrowing a cloud SDK
//! would apply server-side.  Used as the reference provider in tests and
//! for hosts that source their inventory out of band.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::ComputeProvider;
use crate::config::DiscoveryConfig;
use crate::types::NodeRecord;

pub struct InMemoryProvider {
    config: DiscoveryConfig,
    records: Vec<NodeRecord>,
}

impl InMemoryProvider {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<NodeRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn push(&mut self, record: NodeRecord) {
        self.records.push(record);
    }

    /// Applies the configured inventory filters to one record.
    fn matches(&self, record: &NodeRecord) -> bool {
        if let Some(group) = &self.config.group {
            if record.group.as_deref() != Some(group.as_str()) {
                return false;
            }
        }

        if !self.config.regions.is_empty() {
            let in_region = record
                .region()
                .map(|region| self.config.regions.iter().any(|r| r == region))
                .unwrap_or(false);
            if !in_region {
                return false;
            }
        }

        // Tag values pair with tag keys by position when both are set;
        // keys alone check presence, values alone match any tag.
        if !self.config.tag_keys.is_empty() && !self.config.tag_values.is_empty() {
            for (key, value) in self.config.tag_keys.iter().zip(&self.config.tag_values) {
                if record.tags.get(key) != Some(value) {
                    return false;
                }
            }
        } else {
            for key in &self.config.tag_keys {
                if !record.tags.contains_key(key) {
                    return false;
                }
            }
            for value in &self.config.tag_values {
                if !record.tags.values().any(|v| v == value) {
                    return false;
                }
            }
        }

        true
    }
}

#[async_trait]
impl ComputeProvider for InMemoryProvider {
    async fn build(&mut self) -> Result<()> {
        debug!(
            "Building in-memory inventory with {} records",
            self.records.len()
        );
        Ok(())
    }

    async fn list_filtered(&self) -> Result<Vec<NodeRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect())
    }

    async fn destroy(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn service_port(&self) -> u16 {
        self.config.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, LocationScope, NodeState};

    fn record(id: &str) -> NodeRecord {
        NodeRecord::new(id, format!("host-{id}"), NodeState::Running)
    }

    fn provider(config: DiscoveryConfig) -> InMemoryProvider {
        InMemoryProvider::new(config).with_records(vec![
            record("a")
                .with_group("cluster-a")
                .with_tag("env", "prod")
                .with_location(
                    Location::new(LocationScope::Zone, "us-east-1a")
                        .within(Location::new(LocationScope::Region, "us-east-1")),
                ),
            record("b")
                .with_group("cluster-b")
                .with_tag("env", "staging")
                .with_location(Location::new(LocationScope::Region, "eu-west-1")),
            record("c"),
        ])
    }

    fn ids(records: &[NodeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn no_filters_returns_everything_in_order() {
        let provider = provider(DiscoveryConfig::default());
        let records = provider.list_filtered().await.unwrap();
        assert_eq!(ids(&records), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn group_filter_requires_exact_match() {
        let provider = provider(DiscoveryConfig {
            group: Some("cluster-a".into()),
            ..Default::default()
        });
        let records = provider.list_filtered().await.unwrap();
        assert_eq!(ids(&records), vec!["a"]);
    }

    #[tokio::test]
    async fn region_filter_walks_the_location_chain() {
        let provider = provider(DiscoveryConfig {
            regions: vec!["us-east-1".into()],
            ..Default::default()
        });
        let records = provider.list_filtered().await.unwrap();
        assert_eq!(ids(&records), vec!["a"]);
    }

    #[tokio::test]
    async fn paired_tag_filters_match_key_and_value() {
        let provider = provider(DiscoveryConfig {
            tag_keys: vec!["env".into()],
            tag_values: vec!["staging".into()],
            ..Default::default()
        });
        let records = provider.list_filtered().await.unwrap();
        assert_eq!(ids(&records), vec!["b"]);
    }

    #[tokio::test]
    async fn tag_keys_alone_check_presence() {
        let provider = provider(DiscoveryConfig {
            tag_keys: vec!["env".into()],
            ..Default::default()
        });
        let records = provider.list_filtered().await.unwrap();
        assert_eq!(ids(&records), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn service_port_comes_from_config() {
        let provider = provider(DiscoveryConfig {
            port: 5801,
            ..Default::default()
        });
        assert_eq!(provider.service_port(), 5801);
    }
}
