//! Cloud resources backing agent keys and validator checkpoint storage.
//!
//! Resource names are derived from the deployment scope alone so that repeated
//! runs, and runs from different operators, converge on the same resources.

use std::fmt;

use derive_new::new;
use hyperlane_infra_core::{ChainName, Context, KeyConfig, KeyRole};

pub use aws::*;
pub use in_memory::*;

mod aws;
mod in_memory;

/// The agent a set of cloud resources belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
pub struct ProvisioningScope {
    /// Deploy environment, e.g. `testnet3`
    pub environment: String,
    /// Deployment context within the environment
    pub context: Context,
    /// Role the agent runs as
    pub role: KeyRole,
    /// Chain the agent serves
    pub chain: ChainName,
    /// Position of a validator among the chain's non-readonly validators
    pub index: Option<usize>,
    /// Cloud region the resources live in
    pub region: String,
}

impl ProvisioningScope {
    fn role_suffix(&self) -> String {
        match self.index {
            Some(index) => format!("{}-{}-{}", self.chain, self.role, index),
            None => format!("{}-{}", self.chain, self.role),
        }
    }

    /// Name of the cloud identity (IAM user) the agent authenticates as
    pub fn identity_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.context,
            self.environment,
            self.role_suffix()
        )
    }

    /// Alias of the agent's signing key
    pub fn key_alias(&self) -> String {
        format!(
            "alias/{}-{}-key-{}",
            self.context,
            self.environment,
            self.role_suffix()
        )
    }
}

impl fmt::Display for ProvisioningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity_name(), self.region)
    }
}

/// A signing key that exists in the cloud key store
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct KeyHandle {
    /// Alias the key is addressed by
    pub alias: String,
    /// Region of the key
    pub region: String,
}

impl KeyHandle {
    /// The signer config an agent uses to sign with this key
    pub fn key_config(&self) -> KeyConfig {
        KeyConfig::Managed {
            id: self.alias.clone(),
            region: self.region.clone(),
        }
    }
}
