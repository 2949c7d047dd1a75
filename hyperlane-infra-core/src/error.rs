use std::error::Error as StdError;

use crate::ChainName;

/// Errors raised while compiling agent configs or verifying validator
/// checkpoints.
#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    /// A required policy, override or chain entry was not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A policy requires a secret that does not exist in the secret store.
    #[error("Expected {purpose} secret named `{name}` to exist, have you created it?")]
    SecretMissing {
        /// What the secret is used for
        purpose: &'static str,
        /// The full secret name
        name: String,
    },
    /// The verifier was given a validator whose checkpoint syncer is not
    /// backed by object storage.
    #[error("Cannot check non-s3 validator {validator} on {chain}")]
    UnsupportedSyncer {
        /// The chain being verified
        chain: ChainName,
        /// The validator name
        validator: String,
    },
    /// Fetching or comparing checkpoints of a single candidate failed. The
    /// result for that candidate is inconclusive.
    #[error("Comparing validator {validator} on {chain} failed")]
    Comparison {
        /// The chain being verified
        chain: ChainName,
        /// The candidate validator name
        validator: String,
        /// Underlying fetch error
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A cloud resource could not be ensured.
    #[error("Failed to ensure {resource} `{name}`")]
    Provisioning {
        /// Kind of resource, e.g. "kms key"
        resource: &'static str,
        /// Deterministic resource name
        name: String,
        /// Underlying provider error
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A domain id which does not belong to any known chain.
    #[error("Unknown or invalid domain ID ({0})")]
    UnknownDomainId(u32),
}

impl InfraError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
