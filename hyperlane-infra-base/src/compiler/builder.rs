use std::collections::BTreeMap;

use derive_new::new;
use eyre::{Context as _, Result};
use futures_util::future::try_join_all;
use itertools::Itertools;
use tracing::{info, instrument};

use hyperlane_infra_core::{ChainName, InfraError};

use super::{
    gelato_secret_name, require_secret, AgentRuntimeConfig, GasEnforcementCompiler,
    KeyPolicyResolver, MultisigCheckpointSyncerConfig, RelayerConfig, TransactionSubmissionType,
    ValidatorConfig,
};
use crate::settings::{AgentConfig, ValidatorSet};
use crate::{Provisioner, SecretStore};

/// Composes the resolved policies of a context into the runtime config of
/// each of its chains.
#[derive(Debug, new)]
pub struct AgentConfigBuilder<'a> {
    agent: &'a AgentConfig,
    provisioner: &'a dyn Provisioner,
    secrets: &'a dyn SecretStore,
}

impl<'a> AgentConfigBuilder<'a> {
    fn validator_set(&self, chain: ChainName) -> Result<&'a ValidatorSet, InfraError> {
        self.agent.validator_sets.get(&chain).ok_or_else(|| {
            InfraError::config(format!(
                "No validator set configured for {chain} in {}:{}",
                self.agent.environment, self.agent.context
            ))
        })
    }

    fn keys(&self, chain: ChainName) -> KeyPolicyResolver<'_> {
        KeyPolicyResolver::new(self.agent, chain, self.provisioner)
    }

    /// The relayer config of `chain`, `None` when relayers are disabled.
    #[instrument(skip(self))]
    pub async fn relayer_config(&self, chain: ChainName) -> Result<Option<RelayerConfig>> {
        let Some(relayer) = &self.agent.relayer else {
            return Ok(None);
        };
        let base = relayer.for_chain(chain);

        let checkpoint_syncers = self
            .validator_set(chain)?
            .validators
            .iter()
            .map(|v| (format!("{:?}", v.address), v.checkpoint_syncer.clone()))
            .collect();

        let gas_payment_enforcement = GasEnforcementCompiler::new(&self.agent.run_env, self.secrets)
            .compile(&base.gas_payment_enforcement)
            .await?;

        Ok(Some(RelayerConfig {
            origin_chain_name: chain,
            multisig_checkpoint_syncer: MultisigCheckpointSyncerConfig { checkpoint_syncers },
            gas_payment_enforcement,
            whitelist: base
                .whitelist
                .map(|list| list.compile().to_json_string())
                .transpose()?,
            blacklist: base
                .blacklist
                .map(|list| list.compile().to_json_string())
                .transpose()?,
            transaction_gas_limit: base.transaction_gas_limit.map(|limit| limit.to_string()),
            skip_transaction_gas_limit_for: base
                .skip_transaction_gas_limit_for
                .map(|chains| chains.iter().join(",")),
        }))
    }

    /// One config per operated validator of `chain`, `None` when validators
    /// are disabled.
    #[instrument(skip(self))]
    pub async fn validator_configs(&self, chain: ChainName) -> Result<Option<Vec<ValidatorConfig>>> {
        let Some(validator) = &self.agent.validator else {
            return Ok(None);
        };
        let base = validator.for_chain(chain);
        let keys = self.keys(chain);

        let configs = try_join_all(self.validator_set(chain)?.operated().map(|(index, val)| {
            let keys = &keys;
            let base = &base;
            async move {
                Ok::<_, eyre::Report>(ValidatorConfig {
                    interval: base.interval,
                    reorg_period: base.reorg_period,
                    origin_chain_name: chain,
                    checkpoint_syncer: val.checkpoint_syncer.clone(),
                    validator: keys.validator_key(index, val).await?,
                })
            }
        }))
        .await?;
        Ok(Some(configs))
    }

    /// Fails unless the Gelato API key exists when any chain relays through
    /// Gelato.
    pub async fn ensure_gelato_secret(&self) -> Result<bool> {
        if self.agent.gelato_chains().is_empty() {
            return Ok(false);
        }
        require_secret(
            self.secrets,
            gelato_secret_name(&self.agent.run_env),
            "Gelato API Key",
        )
        .await?;
        Ok(true)
    }

    /// How the relayer submits transactions on `chain`
    pub fn transaction_submission_type(&self, chain: ChainName) -> TransactionSubmissionType {
        if self.agent.gelato_chains().contains(&chain) {
            TransactionSubmissionType::Gelato
        } else {
            TransactionSubmissionType::Signer
        }
    }

    async fn build_chain(&self, chain: ChainName) -> Result<AgentRuntimeConfig> {
        let validator_set = self.validator_set(chain)?;
        let (relayer, validators) =
            futures_util::try_join!(self.relayer_config(chain), self.validator_configs(chain))?;

        let keys = self.keys(chain);
        let (signers, relayer_requires_aws_credentials) = if relayer.is_some() {
            (
                Some(keys.signers().await?),
                keys.relayer_requires_aws_credentials(validator_set).await?,
            )
        } else {
            (None, false)
        };

        Ok(AgentRuntimeConfig {
            environment: self.agent.environment.clone(),
            namespace: self.agent.namespace.clone(),
            context: self.agent.context,
            chain,
            domain: chain.domain_id(),
            relayer,
            validators,
            signers,
            relayer_requires_aws_credentials,
            transaction_submission_type: self.transaction_submission_type(chain),
        })
    }

    /// The runtime config of the agents of `chain`.
    #[instrument(skip(self))]
    pub async fn build(&self, chain: ChainName) -> Result<AgentRuntimeConfig> {
        self.ensure_gelato_secret().await?;
        self.build_chain(chain)
            .await
            .with_context(|| format!("Building agent config for {chain}"))
    }

    /// The runtime config of every context chain, built concurrently. Fails if
    /// any chain fails.
    #[instrument(skip(self), fields(environment = %self.agent.environment, context = %self.agent.context))]
    pub async fn build_all(&self) -> Result<BTreeMap<ChainName, AgentRuntimeConfig>> {
        self.ensure_gelato_secret().await?;
        let configs = try_join_all(self.agent.context_chain_names.iter().map(|&chain| async move {
            self.build_chain(chain)
                .await
                .with_context(|| format!("Building agent config for {chain}"))
                .map(|config| (chain, config))
        }))
        .await?;
        info!(chains = configs.len(), "Built agent configs");
        Ok(configs.into_iter().collect())
    }
}
