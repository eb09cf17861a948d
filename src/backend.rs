//! Backend client boundary
//!
//! The registry core never talks to the network itself. Implementations of
//! [`BackendClient`] own the transport, including any retry or backoff
//! policy, and hand back raw version numbers and envelope payloads.
//! [`sync_registry`] drives one check-and-apply cycle over that boundary.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::codec::EnvelopeCodec;
use crate::error::Result;
use crate::registry::ConfigRegistry;

/// Remote source of versioned configuration snapshots
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Current configuration version on the backend
    ///
    /// Invoked on every check cycle, so implementations must keep this cheap.
    async fn remote_version(&self) -> Result<u64>;

    /// Full envelope snapshot for the requested version
    async fn fetch_configuration(&self, version: u64) -> Result<String>;
}

/// Outcome of one [`sync_registry`] cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Whether an envelope was fetched and applied
    pub updated: bool,
    /// Registry version after the cycle
    pub local_version: u64,
    /// Version the backend reported
    pub remote_version: u64,
}

/// Check the backend and apply a newer configuration if one exists
///
/// Fetch happens over the async boundary; the decoded envelope is then
/// applied in a single synchronous step, so readers scheduled around this
/// call never observe a half-applied registry. Concurrent cycles against the
/// same registry must be serialized by the caller.
pub async fn sync_registry(
    registry: &mut ConfigRegistry,
    codec: &EnvelopeCodec,
    backend: &dyn BackendClient,
) -> Result<SyncReport> {
    let remote_version = backend.remote_version().await?;
    let local_version = registry.version();

    if remote_version <= local_version {
        debug!(local_version, remote_version, "configuration up to date");
        return Ok(SyncReport {
            updated: false,
            local_version,
            remote_version,
        });
    }

    let text = backend.fetch_configuration(remote_version).await?;
    codec.apply(registry, &text)?;

    info!(
        from = local_version,
        to = registry.version(),
        "applied remote configuration"
    );

    Ok(SyncReport {
        updated: true,
        local_version: registry.version(),
        remote_version,
    })
}
