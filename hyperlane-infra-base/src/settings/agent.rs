use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use hyperlane_infra_core::{
    decl_overridable, matching_list::MatchingListConf, ChainName, ChainOverridableConfig,
    Context, GasPaymentEnforcementConf, InfraError, KeyRole,
};

use super::ValidatorSet;

decl_overridable!(
    /// Incomplete basic validator agent config
    #[derive(Debug, PartialEq, Eq)]
    pub struct BaseValidatorConfig {
        /// How frequently to check for new checkpoints, in seconds
        pub interval: u64,
        /// The reorg period in blocks
        pub reorg_period: u64,
    }
);

decl_overridable!(
    /// Incomplete basic relayer agent config
    #[derive(Debug, PartialEq)]
    pub struct BaseRelayerConfig {
        /// Gas payment enforcement policy and its whitelist
        pub gas_payment_enforcement: GasPaymentEnforcementConf,
        /// Only messages matching this list are relayed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub whitelist: Option<MatchingListConf>,
        /// Messages matching this list are never relayed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub blacklist: Option<MatchingListConf>,
        /// Upper bound on gas for a single process transaction
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub transaction_gas_limit: Option<u64>,
        /// Destinations exempt from `transactionGasLimit`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub skip_transaction_gas_limit_for: Option<Vec<ChainName>>,
    }
);

/// AWS settings; their presence switches agents to KMS managed keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsConfig {
    /// Region keys and identities are created in
    pub region: String,
}

/// Chains whose relayer submits transactions through Gelato
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GelatoConfig {
    /// List of chains in which using Gelato is enabled for
    #[serde(default)]
    pub enabled_chains: Vec<ChainName>,
}

/// Agent policy of one context within a deploy environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Deploy environment, e.g. `testnet3`
    pub environment: String,
    /// Kubernetes namespace the agents run in
    pub namespace: String,
    /// Environment whose secrets the agents use
    pub run_env: String,
    /// Deployment context
    pub context: Context,
    /// Managed key settings
    #[serde(default)]
    pub aws: Option<AwsConfig>,
    /// Names of all chains in the environment
    pub environment_chain_names: Vec<ChainName>,
    /// Names of chains this context cares about
    pub context_chain_names: Vec<ChainName>,
    /// Validator set of each chain
    pub validator_sets: BTreeMap<ChainName, ValidatorSet>,
    /// Fee relaying settings
    #[serde(default)]
    pub gelato: Option<GelatoConfig>,
    /// Validator agent settings; validators are not run when absent
    #[serde(default)]
    pub validator: Option<ChainOverridableConfig<BaseValidatorConfig>>,
    /// Relayer agent settings; relayers are not run when absent
    #[serde(default)]
    pub relayer: Option<ChainOverridableConfig<BaseRelayerConfig>>,
    /// Roles to manage keys for
    #[serde(default)]
    pub roles_with_keys: Vec<KeyRole>,
}

impl AgentConfig {
    /// Whether agent keys live in KMS
    pub fn aws_keys(&self) -> bool {
        self.aws.is_some()
    }

    /// Chains with Gelato submission enabled
    pub fn gelato_chains(&self) -> &[ChainName] {
        self.gelato
            .as_ref()
            .map(|g| g.enabled_chains.as_slice())
            .unwrap_or_default()
    }

    /// Check that all chains referenced belong to the environment and every
    /// validator set is well formed.
    pub fn validate(&self) -> Result<(), InfraError> {
        let environment_chains: HashSet<_> = self.environment_chain_names.iter().collect();
        let foreign = |chain: &ChainName, what: &str| {
            InfraError::config(format!(
                "{what} chain {chain} of {}:{} is not part of the environment",
                self.environment, self.context
            ))
        };

        for chain in &self.context_chain_names {
            if !environment_chains.contains(chain) {
                return Err(foreign(chain, "Context"));
            }
        }
        for chain in self.gelato_chains() {
            if !environment_chains.contains(chain) {
                return Err(foreign(chain, "Gelato"));
            }
        }
        for (chain, set) in &self.validator_sets {
            if !environment_chains.contains(chain) {
                return Err(foreign(chain, "Validator set"));
            }
            set.validate(*chain)?;
        }
        Ok(())
    }
}
