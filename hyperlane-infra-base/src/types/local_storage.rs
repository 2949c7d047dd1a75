use std::path::PathBuf;

use async_trait::async_trait;
use derive_new::new;
use eyre::{Context, Result};

use hyperlane_infra_core::SignedCheckpoint;

use crate::traits::CheckpointSyncer;

#[derive(Debug, Clone, new)]
/// Type for reading checkpoints a validator wrote to a local directory
pub struct LocalStorage {
    /// base path
    path: PathBuf,
}

impl LocalStorage {
    fn checkpoint_file_path(&self, index: u32) -> PathBuf {
        self.path.join(format!("{}.json", index))
    }

    fn latest_index_file_path(&self) -> PathBuf {
        self.path.join("index.json")
    }
}

#[async_trait]
impl CheckpointSyncer for LocalStorage {
    async fn latest_index(&self) -> Result<Option<u32>> {
        let path = self.latest_index_file_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let index = data
                    .trim()
                    .parse()
                    .with_context(|| format!("Parsing latest index in {path:?}"))?;
                Ok(Some(index))
            }
            _ => Ok(None),
        }
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>> {
        let path = self.checkpoint_file_path(index);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                let checkpoint = serde_json::from_slice(&data)
                    .with_context(|| format!("Parsing checkpoint in {path:?}"))?;
                Ok(Some(checkpoint))
            }
            _ => Ok(None),
        }
    }
}
