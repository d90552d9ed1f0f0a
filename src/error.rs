//! Error taxonomy for the discovery plugin.

use thiserror::Error;

/// Errors surfaced to the host framework.
///
/// Address-resolution problems are configuration errors and abort the
/// in-progress discovery pass without wrapping; everything else that goes
/// wrong while enumerating the inventory is wrapped into
/// [`DiscoveryError::Discovery`] with the cause attached.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An inventory address string could not be resolved to an IP address.
    #[error("address '{address}' could not be resolved")]
    InvalidConfiguration { address: String },

    /// A recognized configuration property carried an unusable value.
    #[error("invalid property '{key}': {message}")]
    InvalidProperty { key: String, message: String },

    /// Layered configuration (file/env) failed to load.
    #[error("failed to load configuration")]
    Config(#[from] figment::Error),

    /// The inventory enumeration itself failed (connectivity, auth, ...).
    #[error("failed to get registered addresses")]
    Discovery(#[source] anyhow::Error),

    /// A provider lifecycle call (build/destroy) failed.
    #[error("compute provider error")]
    Provider(#[source] anyhow::Error),
}

impl DiscoveryError {
    pub(crate) fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            address: address.into(),
        }
    }

    pub(crate) fn invalid_property(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
