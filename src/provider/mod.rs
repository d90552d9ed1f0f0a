use anyhow::Result;
use async_trait::async_trait;

use crate::types::NodeRecord;

pub mod inventory;
pub use inventory::InMemoryProvider;

/// Narrow interface to the external compute-service abstraction.
///
/// All inventory retrieval and filtering (group, regions, tags) happens
/// behind this boundary; cloud-specific SDK glue lives entirely outside
/// the discovery core.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Establish the provider connection.  Blocking from the caller's
    /// point of view; no timeout is imposed here.
    async fn build(&mut self) -> Result<()>;

    /// Current snapshot of node records matching the configured filters,
    /// in the provider's iteration order.
    async fn list_filtered(&self) -> Result<Vec<NodeRecord>>;

    /// Release provider resources.
    async fn destroy(&mut self) -> Result<()>;

    /// Service port discovered members are assumed to listen on.
    fn service_port(&self) -> u16;
}
