use std::collections::BTreeMap;

use derive_new::new;
use eyre::Result;
use tracing::{instrument, warn};

use hyperlane_infra_core::{ChainName, KeyConfig, KeyRole};

use crate::provisioning::ProvisioningScope;
use crate::settings::{AgentConfig, CheckpointSyncerConf, Validator, ValidatorSet};
use crate::Provisioner;

/// Decides where the keys of one chain's agents live, provisioning managed
/// keys as it goes.
#[derive(Debug, new)]
pub struct KeyPolicyResolver<'a> {
    agent: &'a AgentConfig,
    chain: ChainName,
    provisioner: &'a dyn Provisioner,
}

impl<'a> KeyPolicyResolver<'a> {
    fn scope(&self, role: KeyRole, index: Option<usize>, region: &str) -> ProvisioningScope {
        ProvisioningScope::new(
            self.agent.environment.clone(),
            self.agent.context,
            role,
            self.chain,
            index,
            region.to_owned(),
        )
    }

    /// Key config of `role` on this chain. Managed keys are ensured to exist;
    /// without AWS the key is injected externally and nothing is provisioned.
    #[instrument(skip(self), fields(chain = %self.chain))]
    pub async fn key_config(&self, role: KeyRole) -> Result<KeyConfig> {
        let Some(aws) = &self.agent.aws else {
            return Ok(KeyConfig::External);
        };
        let scope = self.scope(role, None, &aws.region);
        self.provisioner.ensure_identity(&scope).await?;
        Ok(self.provisioner.ensure_key(&scope).await?.key_config())
    }

    /// The relayer signer for every context chain. One relayer key signs on
    /// all destinations.
    #[instrument(skip(self), fields(chain = %self.chain))]
    pub async fn signers(&self) -> Result<BTreeMap<ChainName, KeyConfig>> {
        let key = self.key_config(KeyRole::Relayer).await?;
        Ok(self
            .agent
            .context_chain_names
            .iter()
            .map(|chain| (*chain, key.clone()))
            .collect())
    }

    /// Key of the operated validator at `index`. S3 publishing validators get
    /// an identity and bucket; the key itself is only managed with AWS keys.
    #[instrument(skip(self, validator), fields(chain = %self.chain, validator = %validator.name))]
    pub async fn validator_key(&self, index: usize, validator: &Validator) -> Result<KeyConfig> {
        let CheckpointSyncerConf::S3 { bucket, region } = &validator.checkpoint_syncer else {
            warn!(
                address = ?validator.address,
                "Validator's checkpoint syncer is not S3-based. Be sure this is a non-k8s-based environment!"
            );
            return Ok(KeyConfig::External);
        };

        let scope = self.scope(KeyRole::Validator, Some(index), region);
        self.provisioner.ensure_identity(&scope).await?;
        self.provisioner.ensure_storage_bucket(&scope, bucket).await?;
        if self.agent.aws_keys() {
            Ok(self.provisioner.ensure_key(&scope).await?.key_config())
        } else {
            Ok(KeyConfig::External)
        }
    }

    /// Whether the relayer needs AWS credentials, either to sign with a
    /// managed key or to read checkpoints from S3. The credentials are
    /// ensured when needed.
    #[instrument(skip(self, validator_set), fields(chain = %self.chain))]
    pub async fn relayer_requires_aws_credentials(
        &self,
        validator_set: &ValidatorSet,
    ) -> Result<bool> {
        let s3_region = validator_set
            .first_s3_syncer()
            .and_then(|syncer| match syncer {
                CheckpointSyncerConf::S3 { region, .. } => Some(region.as_str()),
                CheckpointSyncerConf::LocalStorage { .. } => None,
            });
        let Some(region) = self
            .agent
            .aws
            .as_ref()
            .map(|aws| aws.region.as_str())
            .or(s3_region)
        else {
            return Ok(false);
        };

        let scope = self.scope(KeyRole::Relayer, None, region);
        self.provisioner.ensure_identity(&scope).await?;
        if self.agent.aws_keys() {
            self.provisioner.ensure_key(&scope).await?;
        }
        Ok(true)
    }
}
