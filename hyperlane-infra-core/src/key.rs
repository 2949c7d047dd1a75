use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

/// Roles which may hold a key managed by the infra tooling.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum KeyRole {
    /// Validator agent signing checkpoints
    Validator,
    /// Relayer agent submitting transactions
    Relayer,
    /// Contract deployer
    Deployer,
    /// Test message sender
    Kathy,
    /// Funds other keys
    Bank,
}

/// Deployment contexts sharing one environment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Context {
    /// The canonical Hyperlane deployment
    Hyperlane,
    /// Release candidate agents
    #[serde(rename = "rc")]
    #[strum(serialize = "rc")]
    ReleaseCandidate,
    /// Flowcarbon deployment
    Flowcarbon,
}

/// Where an agent's signing key lives. Consumed by the agent as its signer
/// config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyConfig {
    /// A cloud KMS resident key
    #[serde(rename = "aws")]
    Managed {
        /// ID of the key, can be an alias of the form `alias/foo-bar`
        id: String,
        /// Region of the key
        region: String,
    },
    /// The private key is injected out of band (e.g. by external-secrets) and
    /// never passes through the config compiler.
    #[serde(rename = "hexKey")]
    External,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn key_config_matches_agent_signer_tags() {
        let managed = KeyConfig::Managed {
            id: "alias/hyperlane-testnet3-key-alfajores-validator-0".into(),
            region: "us-east-1".into(),
        };
        assert_eq!(
            serde_json::to_string(&managed).unwrap(),
            r#"{"type":"aws","id":"alias/hyperlane-testnet3-key-alfajores-validator-0","region":"us-east-1"}"#
        );
        assert_eq!(
            serde_json::to_string(&KeyConfig::External).unwrap(),
            r#"{"type":"hexKey"}"#
        );
    }

    #[test]
    fn context_names() {
        assert_eq!(Context::ReleaseCandidate.to_string(), "rc");
        assert_eq!(Context::from_str("hyperlane").unwrap(), Context::Hyperlane);
        assert_eq!(
            serde_json::from_str::<Context>("\"rc\"").unwrap(),
            Context::ReleaseCandidate
        );
        assert_eq!(KeyRole::Validator.to_string(), "validator");
    }
}
