//! Cloud compute-inventory member discovery.
//!
//! This crate discovers cluster member addresses by querying a cloud
//! provider's compute inventory, keeping only running nodes and mapping
//! each to private/public socket endpoints at the configured service
//! port.  As a side effect it extracts partition-placement hints (host,
//! availability zone) for the node whose address matches the local
//! machine.
//!
//! The crate is a plugin: a host cluster framework instantiates
//! [`CloudDiscovery`] with a [`ComputeProvider`] implementation and
//! drives it through the [`DiscoveryStrategy`] trait.
//!
//! # Example
//!
//! ```
//! use nimbus_discovery::{
//!     CloudDiscovery, DiscoveryConfig, DiscoveryStrategy, InMemoryProvider, Location,
//!     LocationScope, NodeRecord, NodeState,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), nimbus_discovery::DiscoveryError> {
//! let provider = InMemoryProvider::new(DiscoveryConfig::default()).with_records(vec![
//!     NodeRecord::new("i-1", "node-1", NodeState::Running)
//!         .with_private_address("10.0.0.17")
//!         .with_location(Location::new(LocationScope::Zone, "us-east-1a")),
//!     NodeRecord::new("i-2", "node-2", NodeState::Terminated)
//!         .with_private_address("10.0.0.18"),
//! ]);
//!
//! let mut strategy = CloudDiscovery::new(provider);
//! strategy.start().await?;
//! let nodes = strategy.discover_nodes().await?;
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(
//!     nodes[0].private_endpoint.unwrap().to_string(),
//!     "10.0.0.17:5701"
//! );
//! strategy.destroy().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod net;
pub mod provider;
pub mod types;

pub use config::{DiscoveryConfig, DEFAULT_SERVICE_PORT};
pub use discovery::{CloudDiscovery, DiscoveryStrategy};
pub use error::DiscoveryError;
pub use logging::{LogBridge, LogSink};
pub use provider::{ComputeProvider, InMemoryProvider};
pub use types::{
    DiscoveredNode, Location, LocationScope, NodeRecord, NodeState, METADATA_KEY_HOST,
    METADATA_KEY_ZONE,
};
