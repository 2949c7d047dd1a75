use std::{fmt, time::Duration};

use async_trait::async_trait;
use derive_new::new;
use eyre::{bail, Result};
use futures_util::TryStreamExt;
use once_cell::sync::OnceCell;
use rusoto_core::{
    credential::{Anonymous, AwsCredentials, StaticProvider},
    HttpClient, Region, RusotoError,
};
use rusoto_s3::{GetObjectError, GetObjectRequest, S3Client, S3};
use tokio::time::timeout;

use hyperlane_infra_core::SignedCheckpoint;

use crate::CheckpointSyncer;

/// The timeout for S3 requests. Rusoto doesn't offer timeout configuration
/// out of the box, so S3 requests must be wrapped with a timeout.
/// See https://github.com/rusoto/rusoto/issues/1795.
const S3_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Clone, new)]
/// Type for reading checkpoints from a validator's public S3 bucket
pub struct S3Storage {
    /// The name of the bucket.
    bucket: String,
    /// The region of the bucket.
    region: Region,
    /// A client without credentials for anonymous requests.
    #[new(default)]
    anonymous_client: OnceCell<S3Client>,
}

impl fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Storage")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

impl S3Storage {
    /// Uses an anonymous client. This should only be used for publicly accessible buckets.
    async fn anonymously_read_from_bucket(&self, key: String) -> Result<Option<Vec<u8>>> {
        let req = GetObjectRequest {
            key,
            bucket: self.bucket.clone(),
            ..Default::default()
        };
        let get_object_result = timeout(
            Duration::from_secs(S3_REQUEST_TIMEOUT_SECONDS),
            self.anonymous_client()?.get_object(req),
        )
        .await?;

        match get_object_result {
            Ok(res) => match res.body {
                Some(body) => Ok(Some(body.map_ok(|b| b.to_vec()).try_concat().await?)),
                None => Ok(None),
            },
            Err(RusotoError::Service(GetObjectError::NoSuchKey(_))) => Ok(None),
            Err(e) => bail!(e),
        }
    }

    /// Gets an anonymous S3Client, creating it if it doesn't already exist.
    /// Requests signed with credentials from an unrelated AWS account are
    /// rejected by public buckets, so reads go out unsigned.
    fn anonymous_client(&self) -> Result<&S3Client> {
        self.anonymous_client.get_or_try_init(|| {
            // By default, these credentials are anonymous
            let credentials = AwsCredentials::default();
            if !credentials.is_anonymous() {
                bail!("AWS credentials not anonymous");
            }

            Ok(S3Client::new_with(
                HttpClient::new()?,
                StaticProvider::from(credentials),
                self.region.clone(),
            ))
        })
    }

    fn checkpoint_key(index: u32) -> String {
        format!("checkpoint_{}.json", index)
    }

    fn index_key() -> String {
        "checkpoint_latest_index.json".to_owned()
    }
}

#[async_trait]
impl CheckpointSyncer for S3Storage {
    async fn latest_index(&self) -> Result<Option<u32>> {
        self.anonymously_read_from_bucket(S3Storage::index_key())
            .await?
            .map(|data| serde_json::from_slice(&data))
            .transpose()
            .map_err(Into::into)
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>> {
        self.anonymously_read_from_bucket(S3Storage::checkpoint_key(index))
            .await?
            .map(|data| serde_json::from_slice(&data))
            .transpose()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn object_keys_follow_validator_layout() {
        assert_eq!(S3Storage::checkpoint_key(42), "checkpoint_42.json");
        assert_eq!(S3Storage::index_key(), "checkpoint_latest_index.json");
    }
}
