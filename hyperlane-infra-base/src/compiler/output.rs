use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hyperlane_infra_core::{ChainName, Context, KeyConfig, SerializableGasPaymentEnforcementConf};

use crate::settings::CheckpointSyncerConf;

/// Checkpoint syncer of every validator the relayer gathers signatures from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigCheckpointSyncerConfig {
    /// Keyed by validator address
    pub checkpoint_syncers: BTreeMap<String, CheckpointSyncerConf>,
}

/// Full relayer agent config for a single chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerConfig {
    /// Chain the relayer reads messages from
    pub origin_chain_name: ChainName,
    /// Validator checkpoint storage
    pub multisig_checkpoint_syncer: MultisigCheckpointSyncerConfig,
    /// Gas payment policy with a JSON encoded whitelist
    pub gas_payment_enforcement: SerializableGasPaymentEnforcementConf,
    /// JSON encoded matching list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
    /// JSON encoded matching list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<String>,
    /// Decimal gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_gas_limit: Option<String>,
    /// Comma separated chain names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_transaction_gas_limit_for: Option<String>,
}

/// Full validator agent config for a single chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// How frequently to check for new checkpoints
    pub interval: u64,
    /// The reorg period in blocks
    pub reorg_period: u64,
    /// Chain the validator signs checkpoints of
    pub origin_chain_name: ChainName,
    /// Where checkpoints are published
    pub checkpoint_syncer: CheckpointSyncerConf,
    /// Signing key
    pub validator: KeyConfig,
}

/// How a relayer submits transactions to a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionSubmissionType {
    /// Signed and sent by the relayer's own key
    Signer,
    /// Relayed through Gelato
    Gelato,
}

/// Everything the agents of one chain in one context are configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRuntimeConfig {
    /// Deploy environment
    pub environment: String,
    /// Kubernetes namespace
    pub namespace: String,
    /// Deployment context
    pub context: Context,
    /// Chain name
    pub chain: ChainName,
    /// Domain id of the chain
    pub domain: u32,
    /// Relayer config, absent when relayers are disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer: Option<RelayerConfig>,
    /// One config per operated validator, absent when validators are disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<Vec<ValidatorConfig>>,
    /// Relayer signer per destination chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signers: Option<BTreeMap<ChainName, KeyConfig>>,
    /// Whether the relayer needs AWS credentials mounted
    pub relayer_requires_aws_credentials: bool,
    /// How the relayer submits transactions on this chain
    pub transaction_submission_type: TransactionSubmissionType,
}
