use std::fmt;

use async_trait::async_trait;
use eyre::{eyre, Result};
use rusoto_core::{credential::EnvironmentProvider, Client, HttpClient, Region, RusotoError};
use rusoto_iam::{CreateUserError, CreateUserRequest, GetUserError, GetUserRequest, Iam, IamClient};
use rusoto_kms::{
    CreateAliasError, CreateAliasRequest, CreateKeyRequest, DescribeKeyError, DescribeKeyRequest,
    Kms, KmsClient,
};
use rusoto_s3::{
    CreateBucketConfiguration, CreateBucketError, CreateBucketRequest, HeadBucketError,
    HeadBucketRequest, PutBucketPolicyRequest, S3Client, S3,
};
use tracing::{debug, info, instrument};

use hyperlane_infra_core::InfraError;

use super::{KeyHandle, ProvisioningScope};
use crate::Provisioner;

/// Key spec of agent signing keys, the curve Ethereum signatures use
const KEY_SPEC: &str = "ECC_SECG_P256K1";
const KEY_USAGE: &str = "SIGN_VERIFY";

/// Provisions agent resources with IAM, KMS and S3. Credentials are read from
/// the standard `AWS_*` environment variables.
#[derive(Clone)]
pub struct AwsProvisioner {
    client: Client,
}

impl fmt::Debug for AwsProvisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsProvisioner").finish()
    }
}

fn provisioning_error(
    resource: &'static str,
    name: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> InfraError {
    InfraError::Provisioning {
        resource,
        name: name.to_owned(),
        source: Box::new(source),
    }
}

/// HEAD responses carry no body, so a missing bucket surfaces as a bare 404.
fn is_missing_bucket(err: &RusotoError<HeadBucketError>) -> bool {
    match err {
        RusotoError::Service(HeadBucketError::NoSuchBucket(_)) => true,
        RusotoError::Unknown(res) => res.status.as_u16() == 404,
        _ => false,
    }
}

impl AwsProvisioner {
    /// Create a provisioner sharing one HTTP client across regions
    pub fn new() -> Result<Self> {
        let client = Client::new_with(EnvironmentProvider::default(), HttpClient::new()?);
        Ok(Self { client })
    }

    fn region(scope: &ProvisioningScope) -> Result<Region> {
        scope
            .region
            .parse()
            .map_err(|_| eyre!("Invalid AWS region `{}` for {}", scope.region, scope))
    }

    fn iam(&self, region: Region) -> IamClient {
        IamClient::new_with_client(self.client.clone(), region)
    }

    fn kms(&self, region: Region) -> KmsClient {
        KmsClient::new_with_client(self.client.clone(), region)
    }

    fn s3(&self, region: Region) -> S3Client {
        S3Client::new_with_client(self.client.clone(), region)
    }

    /// Public read access to checkpoints, writes by the validator's identity
    fn bucket_policy(bucket: &str, writer_arn: &str) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": ["s3:GetObject", "s3:ListBucket"],
                    "Resource": [
                        format!("arn:aws:s3:::{bucket}"),
                        format!("arn:aws:s3:::{bucket}/*"),
                    ],
                },
                {
                    "Effect": "Allow",
                    "Principal": { "AWS": writer_arn },
                    "Action": ["s3:DeleteObject", "s3:PutObject"],
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                },
            ],
        })
        .to_string()
    }

    async fn identity_arn(&self, scope: &ProvisioningScope) -> Result<String> {
        let name = scope.identity_name();
        let user = self
            .iam(Self::region(scope)?)
            .get_user(GetUserRequest {
                user_name: Some(name.clone()),
            })
            .await
            .map_err(|e| provisioning_error("identity", &name, e))?
            .user;
        Ok(user.arn)
    }
}

#[async_trait]
impl Provisioner for AwsProvisioner {
    #[instrument(skip(self), fields(identity = %scope.identity_name()))]
    async fn ensure_identity(&self, scope: &ProvisioningScope) -> Result<()> {
        let name = scope.identity_name();
        let iam = self.iam(Self::region(scope)?);
        match iam
            .get_user(GetUserRequest {
                user_name: Some(name.clone()),
            })
            .await
        {
            Ok(_) => {
                debug!("Identity already exists");
                return Ok(());
            }
            Err(RusotoError::Service(GetUserError::NoSuchEntity(_))) => {}
            Err(e) => return Err(provisioning_error("identity", &name, e).into()),
        }

        match iam
            .create_user(CreateUserRequest {
                user_name: name.clone(),
                ..Default::default()
            })
            .await
        {
            Ok(_) => info!("Created identity"),
            Err(RusotoError::Service(CreateUserError::EntityAlreadyExists(_))) => {
                debug!("Identity created concurrently")
            }
            Err(e) => return Err(provisioning_error("identity", &name, e).into()),
        }
        Ok(())
    }

    #[instrument(skip(self), fields(alias = %scope.key_alias()))]
    async fn ensure_key(&self, scope: &ProvisioningScope) -> Result<KeyHandle> {
        let alias = scope.key_alias();
        let handle = KeyHandle::new(alias.clone(), scope.region.clone());
        let kms = self.kms(Self::region(scope)?);
        match kms
            .describe_key(DescribeKeyRequest {
                key_id: alias.clone(),
                ..Default::default()
            })
            .await
        {
            Ok(_) => {
                debug!("Key already exists");
                return Ok(handle);
            }
            Err(RusotoError::Service(DescribeKeyError::NotFound(_))) => {}
            Err(e) => return Err(provisioning_error("key", &alias, e).into()),
        }

        let key_id = kms
            .create_key(CreateKeyRequest {
                customer_master_key_spec: Some(KEY_SPEC.to_owned()),
                key_usage: Some(KEY_USAGE.to_owned()),
                description: Some(format!("Signing key of {}", scope.identity_name())),
                ..Default::default()
            })
            .await
            .map_err(|e| provisioning_error("key", &alias, e))?
            .key_metadata
            .map(|metadata| metadata.key_id)
            .ok_or_else(|| eyre!("KMS returned no metadata for the key created for {alias}"))?;

        match kms
            .create_alias(CreateAliasRequest {
                alias_name: alias.clone(),
                target_key_id: key_id.clone(),
            })
            .await
        {
            Ok(()) => info!(%key_id, "Created key"),
            // Another creator won; the key we just made stays unaliased and unused
            Err(RusotoError::Service(CreateAliasError::AlreadyExists(_))) => {
                debug!(%key_id, "Key alias created concurrently")
            }
            Err(e) => return Err(provisioning_error("key alias", &alias, e).into()),
        }
        Ok(handle)
    }

    #[instrument(skip(self), fields(identity = %scope.identity_name()))]
    async fn ensure_storage_bucket(&self, scope: &ProvisioningScope, bucket: &str) -> Result<()> {
        let buckets = S3Buckets {
            s3: self.s3(Self::region(scope)?),
        };
        let writer_arn = self.identity_arn(scope).await?;
        ensure_bucket(&buckets, bucket, &scope.region, &writer_arn).await
    }
}

/// The S3 calls a checkpoint bucket is provisioned with
#[async_trait]
trait BucketApi: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// False if someone else created the bucket first
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<bool>;

    async fn put_bucket_policy(&self, bucket: &str, policy: String) -> Result<()>;
}

struct S3Buckets {
    s3: S3Client,
}

#[async_trait]
impl BucketApi for S3Buckets {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self
            .s3
            .head_bucket(HeadBucketRequest {
                bucket: bucket.to_owned(),
                ..Default::default()
            })
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if is_missing_bucket(&e) => Ok(false),
            Err(e) => Err(provisioning_error("bucket", bucket, e).into()),
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<bool> {
        // us-east-1 is the implicit location and rejects an explicit constraint
        let create_bucket_configuration =
            (region != "us-east-1").then(|| CreateBucketConfiguration {
                location_constraint: Some(region.to_owned()),
            });
        match self
            .s3
            .create_bucket(CreateBucketRequest {
                bucket: bucket.to_owned(),
                create_bucket_configuration,
                ..Default::default()
            })
            .await
        {
            Ok(_) => Ok(true),
            Err(RusotoError::Service(
                CreateBucketError::BucketAlreadyOwnedByYou(_)
                | CreateBucketError::BucketAlreadyExists(_),
            )) => Ok(false),
            Err(e) => Err(provisioning_error("bucket", bucket, e).into()),
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: String) -> Result<()> {
        self.s3
            .put_bucket_policy(PutBucketPolicyRequest {
                bucket: bucket.to_owned(),
                policy,
                ..Default::default()
            })
            .await
            .map_err(|e| provisioning_error("bucket policy", bucket, e))?;
        Ok(())
    }
}

/// Ensure `bucket` exists with the checkpoint policy. The policy is put on
/// every call, so a run that failed after creating the bucket is repaired by
/// the next one.
async fn ensure_bucket(
    buckets: &dyn BucketApi,
    bucket: &str,
    region: &str,
    writer_arn: &str,
) -> Result<()> {
    if buckets.bucket_exists(bucket).await? {
        debug!("Bucket already exists");
    } else if buckets.create_bucket(bucket, region).await? {
        info!("Created bucket");
    } else {
        debug!("Bucket created concurrently");
    }
    buckets
        .put_bucket_policy(bucket, AwsProvisioner::bucket_policy(bucket, writer_arn))
        .await
}

#[cfg(test)]
mod test {
    use mockall::mock;

    use super::*;

    mock! {
        Buckets {}

        #[async_trait]
        impl BucketApi for Buckets {
            async fn bucket_exists(&self, bucket: &str) -> Result<bool>;
            async fn create_bucket(&self, bucket: &str, region: &str) -> Result<bool>;
            async fn put_bucket_policy(&self, bucket: &str, policy: String) -> Result<()>;
        }
    }

    const BUCKET: &str = "hyperlane-testnet3-goerli-validator-0";
    const WRITER: &str = "arn:aws:iam::000000000000:user/hyperlane-testnet3-goerli-validator-0";

    fn expect_policy(buckets: &mut MockBuckets) {
        buckets
            .expect_put_bucket_policy()
            .withf(|bucket, policy| bucket == BUCKET && policy.contains(WRITER))
            .times(1)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn missing_bucket_is_created_with_policy() {
        let mut buckets = MockBuckets::new();
        buckets.expect_bucket_exists().returning(|_| Ok(false));
        buckets
            .expect_create_bucket()
            .withf(|bucket, region| bucket == BUCKET && region == "us-east-2")
            .times(1)
            .returning(|_, _| Ok(true));
        expect_policy(&mut buckets);

        ensure_bucket(&buckets, BUCKET, "us-east-2", WRITER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn existing_bucket_still_gets_policy() {
        let mut buckets = MockBuckets::new();
        buckets
            .expect_bucket_exists()
            .withf(|bucket| bucket == BUCKET)
            .returning(|_| Ok(true));
        buckets.expect_create_bucket().never();
        expect_policy(&mut buckets);

        ensure_bucket(&buckets, BUCKET, "us-east-1", WRITER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrently_created_bucket_gets_policy() {
        let mut buckets = MockBuckets::new();
        buckets.expect_bucket_exists().returning(|_| Ok(false));
        buckets.expect_create_bucket().returning(|_, _| Ok(false));
        expect_policy(&mut buckets);

        ensure_bucket(&buckets, BUCKET, "us-east-1", WRITER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_policy_is_an_error() {
        let mut buckets = MockBuckets::new();
        buckets.expect_bucket_exists().returning(|_| Ok(true));
        buckets
            .expect_put_bucket_policy()
            .returning(|_, _| Err(eyre!("access denied")));

        assert!(ensure_bucket(&buckets, BUCKET, "us-east-1", WRITER)
            .await
            .is_err());
    }

    #[test]
    fn bucket_policy_grants_public_reads() {
        let policy: serde_json::Value = serde_json::from_str(&AwsProvisioner::bucket_policy(
            "hyperlane-testnet3-goerli-validator-0",
            "arn:aws:iam::000000000000:user/hyperlane-testnet3-goerli-validator-0",
        ))
        .unwrap();
        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements[0]["Principal"], "*");
        assert_eq!(
            statements[1]["Resource"],
            "arn:aws:s3:::hyperlane-testnet3-goerli-validator-0/*"
        );
    }
}
