use std::{fmt, path::PathBuf};

use eyre::{Context, Report, Result};
use rusoto_core::Region;
use serde::{Deserialize, Serialize};

use crate::{CheckpointSyncer, LocalStorage, S3Storage};

/// Checkpoint Syncer types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CheckpointSyncerConf {
    /// A local checkpoint syncer
    LocalStorage {
        /// Path
        path: PathBuf,
    },
    /// A checkpoint syncer on S3
    S3 {
        /// Bucket name
        bucket: String,
        /// S3 Region
        region: String,
    },
}

impl CheckpointSyncerConf {
    /// Whether checkpoints are published to object storage
    pub fn is_s3(&self) -> bool {
        matches!(self, CheckpointSyncerConf::S3 { .. })
    }

    /// Turn conf info a Checkpoint Syncer
    pub fn build(&self) -> Result<Box<dyn CheckpointSyncer>, Report> {
        Ok(match self {
            CheckpointSyncerConf::LocalStorage { path } => Box::new(LocalStorage::new(path.clone())),
            CheckpointSyncerConf::S3 { bucket, region } => Box::new(S3Storage::new(
                bucket.clone(),
                region
                    .parse::<Region>()
                    .with_context(|| format!("Invalid region `{region}` for bucket `{bucket}`"))?,
            )),
        })
    }
}

impl fmt::Display for CheckpointSyncerConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointSyncerConf::LocalStorage { path } => write!(f, "file://{}", path.display()),
            CheckpointSyncerConf::S3 { bucket, region } => write!(f, "s3://{bucket}/{region}"),
        }
    }
}
