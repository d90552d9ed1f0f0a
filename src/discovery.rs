//! Discovery strategy: filters the compute inventory down to running
//! nodes and maps them to socket endpoints the cluster can join.
//!
//! The strategy is a plugin driven entirely by the host cluster
//! framework through [`DiscoveryStrategy`]: the host calls `start` once,
//! runs discovery passes, asks for local placement metadata and finally
//! calls `destroy`.  One pass is a single sequential walk over the
//! provider snapshot; nothing is spawned and nothing is cached except
//! the local metadata map.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use log::{log_enabled, trace, warn, Level};

use crate::error::DiscoveryError;
use crate::net::{self, AddressResolver};
use crate::provider::ComputeProvider;
use crate::types::{DiscoveredNode, NodeRecord, NodeState, METADATA_KEY_HOST, METADATA_KEY_ZONE};

/// Contract the host cluster framework drives the plugin through.
#[async_trait]
pub trait DiscoveryStrategy {
    /// Connects the underlying provider.  Called once before the first
    /// discovery pass.
    async fn start(&mut self) -> Result<(), DiscoveryError>;

    /// Runs one discovery pass and returns the running members, in
    /// inventory iteration order.
    async fn discover_nodes(&mut self) -> Result<Vec<DiscoveredNode>, DiscoveryError>;

    /// Returns partition-placement hints (`host`, `zone`) for the local
    /// member, running a discovery pass first if none has populated them
    /// yet.
    async fn discover_local_metadata(&mut self)
        -> Result<HashMap<String, String>, DiscoveryError>;

    /// Releases provider resources.
    async fn destroy(&mut self) -> Result<(), DiscoveryError>;
}

/// Compute-inventory discovery strategy.
///
/// Generic over the [`ComputeProvider`] so hosts can plug in any cloud
/// SDK glue (or an in-memory inventory) without touching the mapping
/// logic.
pub struct CloudDiscovery<P> {
    provider: P,
    resolver: AddressResolver,
    local_address: Option<IpAddr>,
    local_address_resolved: bool,
    metadata: HashMap<String, String>,
}

impl<P: ComputeProvider> CloudDiscovery<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            resolver: AddressResolver::new(),
            local_address: None,
            local_address_resolved: false,
            metadata: HashMap::new(),
        }
    }

    /// Overrides local-address detection for hosts that already know the
    /// address they bind.
    pub fn with_local_address(mut self, address: IpAddr) -> Self {
        self.local_address = Some(address);
        self.local_address_resolved = true;
        self
    }

    /// The address used for self-matching, detected on first use and
    /// fixed for the lifetime of the strategy.  `None` when detection
    /// failed; self-matching is then disabled.
    pub async fn local_address(&mut self) -> Option<IpAddr> {
        if !self.local_address_resolved {
            self.local_address = net::local_primary_address(&mut self.resolver).await;
            self.local_address_resolved = true;
        }
        self.local_address
    }

    async fn map_record(
        &mut self,
        record: &NodeRecord,
        port: u16,
    ) -> Result<DiscoveredNode, DiscoveryError> {
        let mut private_endpoint = None;
        if let Some(address) = record.private_addresses.first() {
            let ip = self.resolver.resolve(address).await?;
            private_endpoint = Some(SocketAddr::new(ip, port));
            if self.local_address().await == Some(ip) {
                self.capture_local_metadata(record);
            }
        }

        let mut public_endpoint = None;
        if let Some(address) = record.public_addresses.first() {
            let ip = self.resolver.resolve(address).await?;
            public_endpoint = Some(SocketAddr::new(ip, port));
            if self.local_address().await == Some(ip) {
                self.capture_local_metadata(record);
            }
        }

        Ok(DiscoveredNode {
            private_endpoint,
            public_endpoint,
        })
    }

    /// Publishes placement hints for the record that matched the local
    /// address.  First match wins: once populated the map is never
    /// cleared or overwritten.
    fn capture_local_metadata(&mut self, record: &NodeRecord) {
        if !self.metadata.is_empty() {
            return;
        }
        if let Some(zone) = record.zone() {
            self.metadata
                .insert(METADATA_KEY_ZONE.to_string(), zone.to_string());
        }
        self.metadata
            .insert(METADATA_KEY_HOST.to_string(), record.hostname.clone());
    }
}

#[async_trait]
impl<P: ComputeProvider> DiscoveryStrategy for CloudDiscovery<P> {
    async fn start(&mut self) -> Result<(), DiscoveryError> {
        self.provider.build().await.map_err(DiscoveryError::Provider)
    }

    async fn discover_nodes(&mut self) -> Result<Vec<DiscoveredNode>, DiscoveryError> {
        let records = self
            .provider
            .list_filtered()
            .await
            .map_err(DiscoveryError::Discovery)?;
        let port = self.provider.service_port();

        let mut nodes = Vec::with_capacity(records.len());
        for record in &records {
            if record.state != NodeState::Running {
                continue;
            }
            nodes.push(self.map_record(record, port).await?);
        }

        if nodes.is_empty() {
            warn!("No running nodes discovered in configured cloud provider");
        } else if log_enabled!(Level::Trace) {
            let mut listing = String::from("Discovered the following nodes with public addresses:\n");
            for node in &nodes {
                if let Some(endpoint) = node.public_endpoint {
                    listing.push_str(&format!("    {endpoint}\n"));
                }
            }
            trace!("{}", listing);
        }

        Ok(nodes)
    }

    async fn discover_local_metadata(
        &mut self,
    ) -> Result<HashMap<String, String>, DiscoveryError> {
        if self.metadata.is_empty() {
            self.discover_nodes().await?;
        }
        Ok(self.metadata.clone())
    }

    async fn destroy(&mut self) -> Result<(), DiscoveryError> {
        self.provider
            .destroy()
            .await
            .map_err(DiscoveryError::Provider)
    }
}
