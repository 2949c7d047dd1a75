use std::fmt::Debug;

use async_trait::async_trait;
use eyre::Result;

use hyperlane_infra_core::SignedCheckpoint;

/// A generic trait to read Checkpoints published offchain by a validator
#[async_trait]
pub trait CheckpointSyncer: Debug + Send + Sync {
    /// Read the highest index of this Syncer
    async fn latest_index(&self) -> Result<Option<u32>>;
    /// Attempt to fetch the signed checkpoint at this index
    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>>;
}
