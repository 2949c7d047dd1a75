use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use hyperlane_infra_core::{ChainName, InfraError, H160};

use super::CheckpointSyncerConf;

/// A validator enrolled in a validator set. This isn't agent configuration,
/// just the information the validator set publishes about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// Human readable operator name
    pub name: String,
    /// Signing address
    pub address: H160,
    /// Where the validator publishes its signed checkpoints
    pub checkpoint_syncer: CheckpointSyncerConf,
    /// Operated by a third party; no agent is run for it
    #[serde(default)]
    pub readonly: bool,
}

/// The validator set of a single chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSet {
    /// Number of signatures a checkpoint needs
    pub threshold: usize,
    /// Ordered validators; the first is the reference when verifying
    pub validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Check threshold bounds and address uniqueness.
    pub fn validate(&self, chain: ChainName) -> Result<(), InfraError> {
        if self.threshold == 0 {
            return Err(InfraError::config(format!(
                "Validator set of {chain} has a threshold of 0"
            )));
        }
        if self.threshold > self.validators.len() {
            return Err(InfraError::config(format!(
                "Validator set of {chain} has threshold {} but only {} validators",
                self.threshold,
                self.validators.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.validators.iter().find(|v| !seen.insert(v.address)) {
            return Err(InfraError::config(format!(
                "Validator set of {chain} lists {:?} more than once",
                dup.address
            )));
        }
        Ok(())
    }

    /// Validators an agent is run for, indexed by their position among them.
    pub fn operated(&self) -> impl Iterator<Item = (usize, &Validator)> {
        self.validators.iter().filter(|v| !v.readonly).enumerate()
    }

    /// The first validator publishing to S3, if any
    pub fn first_s3_syncer(&self) -> Option<&CheckpointSyncerConf> {
        self.validators
            .iter()
            .map(|v| &v.checkpoint_syncer)
            .find(|syncer| syncer.is_s3())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn validator(name: &str, byte: u8, readonly: bool) -> Validator {
        Validator {
            name: name.into(),
            address: H160::repeat_byte(byte),
            checkpoint_syncer: CheckpointSyncerConf::LocalStorage {
                path: format!("/tmp/{name}").into(),
            },
            readonly,
        }
    }

    #[test]
    fn rejects_invalid_thresholds() {
        let mut set = ValidatorSet {
            threshold: 0,
            validators: vec![validator("a", 1, false)],
        };
        assert!(set.validate(ChainName::Test1).is_err());
        set.threshold = 2;
        assert!(set.validate(ChainName::Test1).is_err());
        set.threshold = 1;
        assert!(set.validate(ChainName::Test1).is_ok());
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let set = ValidatorSet {
            threshold: 1,
            validators: vec![validator("a", 1, false), validator("b", 1, true)],
        };
        let err = set.validate(ChainName::Test2).unwrap_err();
        assert!(err.to_string().contains("test2"));
    }

    #[test]
    fn operated_validators_are_indexed_after_filtering() {
        let set = ValidatorSet {
            threshold: 2,
            validators: vec![
                validator("a", 1, false),
                validator("b", 2, true),
                validator("c", 3, false),
            ],
        };
        let operated: Vec<_> = set.operated().map(|(i, v)| (i, v.name.as_str())).collect();
        assert_eq!(operated, vec![(0, "a"), (1, "c")]);
        assert_eq!(set.first_s3_syncer(), None);
    }

    #[test]
    fn readonly_defaults_to_false() {
        let v: Validator = serde_json::from_str(
            r#"{
                "name": "abacus",
                "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "checkpointSyncer": {"type": "localStorage", "path": "/tmp/x"}
            }"#,
        )
        .unwrap();
        assert!(!v.readonly);
    }
}
