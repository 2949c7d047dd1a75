use std::fmt::Debug;

use async_trait::async_trait;
use eyre::Result;

use crate::provisioning::{KeyHandle, ProvisioningScope};

/// Ensures the cloud resources an agent needs exist.
///
/// Every operation is idempotent: calling it for a resource that already
/// exists succeeds without modifying it, and implementations must tolerate a
/// concurrent creator winning the race (an "already exists" response counts as
/// success).
#[async_trait]
pub trait Provisioner: Debug + Send + Sync {
    /// Ensure the cloud identity the agent authenticates as exists
    async fn ensure_identity(&self, scope: &ProvisioningScope) -> Result<()>;
    /// Ensure the signing key for the scope exists and return a handle to it
    async fn ensure_key(&self, scope: &ProvisioningScope) -> Result<KeyHandle>;
    /// Ensure the checkpoint bucket a validator publishes to exists
    async fn ensure_storage_bucket(&self, scope: &ProvisioningScope, bucket: &str) -> Result<()>;
}
