//! Data structures shared across the discovery plugin.
//!
//! These types are serialised using [`serde`](https://serde.rs/) so that
//! inventory snapshots can be captured, replayed and inspected.  They
//! mirror what a cloud compute inventory reports about a node: its
//! lifecycle state, its addresses and its placement in the provider's
//! location hierarchy.

use std::collections::HashMap;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Metadata key under which the matching node's hostname is published.
pub const METADATA_KEY_HOST: &str = "host";

/// Metadata key under which the matching node's availability zone is
/// published, when the node's location chain carries one.
pub const METADATA_KEY_ZONE: &str = "zone";

/// Lifecycle state of a compute node as reported by the inventory.
///
/// Only [`NodeState::Running`] nodes are eligible for discovery; every
/// other state is skipped.  `Unrecognized` covers states a provider may
/// add that this crate does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Pending,
    Running,
    Suspended,
    Terminated,
    Error,
    Unrecognized,
}

/// Scope of one link in a node's location chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationScope {
    Provider,
    Region,
    Zone,
    System,
    Host,
    Network,
}

/// One link in a node's hierarchical placement descriptor.
///
/// A location points upward at its parent, e.g. a `Zone` whose parent is
/// a `Region` whose parent is the `Provider` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub scope: LocationScope,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Location>>,
}

impl Location {
    pub fn new(scope: LocationScope, id: impl Into<String>) -> Self {
        Self {
            scope,
            id: id.into(),
            parent: None,
        }
    }

    /// Attaches a parent link, returning the child.
    pub fn within(mut self, parent: Location) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Iterates the chain from this location upward through its parents.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }
}

/// Iterator over a location chain, innermost first.
pub struct Ancestors<'a> {
    next: Option<&'a Location>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Location;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// A single node record from the compute inventory.
///
/// Records are produced by the provider and read-only to the discovery
/// strategy.  Address lists keep the provider's ordering; the first entry
/// of each list is the one discovery resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub hostname: String,
    pub state: NodeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub private_addresses: Vec<String>,
    #[serde(default)]
    pub public_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, hostname: impl Into<String>, state: NodeState) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            state,
            group: None,
            tags: HashMap::new(),
            private_addresses: Vec::new(),
            public_addresses: Vec::new(),
            location: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_private_address(mut self, address: impl Into<String>) -> Self {
        self.private_addresses.push(address.into());
        self
    }

    pub fn with_public_address(mut self, address: impl Into<String>) -> Self {
        self.public_addresses.push(address.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Identifier of the first `Zone`-scoped ancestor in the location
    /// chain, if any.
    pub fn zone(&self) -> Option<&str> {
        self.location
            .as_ref()?
            .ancestors()
            .find(|location| location.scope == LocationScope::Zone)
            .map(|location| location.id.as_str())
    }

    /// Identifier of the first `Region`-scoped ancestor in the location
    /// chain, if any.
    pub fn region(&self) -> Option<&str> {
        self.location
            .as_ref()?
            .ancestors()
            .find(|location| location.scope == LocationScope::Region)
            .map(|location| location.id.as_str())
    }
}

/// A cluster member candidate produced by one discovery pass.
///
/// Either endpoint may be absent when the record carried no address of
/// that kind; the mapper does not require one to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredNode {
    pub private_endpoint: Option<SocketAddr>,
    pub public_endpoint: Option<SocketAddr>,
}
