use std::collections::BTreeSet;

use async_trait::async_trait;
use eyre::Result;
use parking_lot::Mutex;
use tracing::info;

use super::{KeyHandle, ProvisioningScope};
use crate::Provisioner;

/// A resource recorded by the [`InMemoryProvisioner`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resource {
    /// A cloud identity
    Identity(String),
    /// A signing key alias
    Key(String),
    /// A checkpoint bucket
    Bucket(String),
}

/// Records the resources it is asked to ensure without touching any cloud
/// provider. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryProvisioner {
    resources: Mutex<BTreeSet<Resource>>,
    creations: Mutex<usize>,
}

impl InMemoryProvisioner {
    /// Every resource ensured so far
    pub fn resources(&self) -> Vec<Resource> {
        self.resources.lock().iter().cloned().collect()
    }

    /// How many resources were newly created
    pub fn creations(&self) -> usize {
        *self.creations.lock()
    }

    fn ensure(&self, resource: Resource) {
        if self.resources.lock().insert(resource.clone()) {
            *self.creations.lock() += 1;
            info!(?resource, "Would create resource");
        }
    }
}

#[async_trait]
impl Provisioner for InMemoryProvisioner {
    async fn ensure_identity(&self, scope: &ProvisioningScope) -> Result<()> {
        self.ensure(Resource::Identity(scope.identity_name()));
        Ok(())
    }

    async fn ensure_key(&self, scope: &ProvisioningScope) -> Result<KeyHandle> {
        let alias = scope.key_alias();
        self.ensure(Resource::Key(alias.clone()));
        Ok(KeyHandle::new(alias, scope.region.clone()))
    }

    async fn ensure_storage_bucket(&self, _scope: &ProvisioningScope, bucket: &str) -> Result<()> {
        self.ensure(Resource::Bucket(bucket.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use hyperlane_infra_core::{ChainName, Context, KeyRole};
    use tracing_test::traced_test;

    use super::*;

    fn fuji_validator() -> ProvisioningScope {
        ProvisioningScope::new(
            "testnet3".into(),
            Context::Hyperlane,
            KeyRole::Validator,
            ChainName::Fuji,
            Some(0),
            "us-east-1".into(),
        )
    }

    #[tokio::test]
    async fn ensuring_twice_creates_once() {
        let provisioner = InMemoryProvisioner::default();
        let scope = fuji_validator();

        for _ in 0..2 {
            provisioner.ensure_identity(&scope).await.unwrap();
            let key = provisioner.ensure_key(&scope).await.unwrap();
            assert_eq!(key.alias, "alias/hyperlane-testnet3-key-fuji-validator-0");
            provisioner
                .ensure_storage_bucket(&scope, "hyperlane-testnet3-fuji-validator-0")
                .await
                .unwrap();
        }

        assert_eq!(provisioner.creations(), 3);
        assert_eq!(
            provisioner.resources(),
            vec![
                Resource::Identity("hyperlane-testnet3-fuji-validator-0".into()),
                Resource::Key("alias/hyperlane-testnet3-key-fuji-validator-0".into()),
                Resource::Bucket("hyperlane-testnet3-fuji-validator-0".into()),
            ]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn new_resources_are_logged() {
        let provisioner = InMemoryProvisioner::default();
        provisioner.ensure_identity(&fuji_validator()).await.unwrap();
        assert!(logs_contain("Would create resource"));
        assert!(logs_contain("hyperlane-testnet3-fuji-validator-0"));
    }
}
