use serde::{Deserialize, Serialize};

use crate::{Signature, H256};

/// An Hyperlane checkpoint
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Checkpoint {
    /// The mailbox address
    pub mailbox_address: H256,
    /// The mailbox chain
    pub mailbox_domain: u32,
    /// The checkpointed root
    pub root: H256,
    /// The index of the checkpoint
    pub index: u32,
}

/// A checkpoint along with the validator's signature over it, as published to
/// checkpoint storage.
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct SignedCheckpoint {
    /// The checkpoint
    pub value: Checkpoint,
    /// The signature
    pub signature: Signature,
}

/// Outcome of comparing one checkpoint index of a candidate validator against
/// the control validator.
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckpointStatus {
    /// Both validators signed the same root
    Valid,
    /// Both validators signed, but different roots
    Invalid,
    /// The candidate has not published this index
    Missing,
    /// The candidate published an index the control has not
    Extra,
}

/// Status of a single checkpoint index
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct CheckpointMetric {
    /// Checkpoint index
    pub index: u32,
    /// Comparison outcome
    pub status: CheckpointStatus,
}

impl CheckpointMetric {
    /// Compare the roots both validators published at `index`.
    pub fn compare(index: u32, control: Option<H256>, candidate: Option<H256>) -> Self {
        let status = match (control, candidate) {
            (_, None) => CheckpointStatus::Missing,
            (None, Some(_)) => CheckpointStatus::Extra,
            (Some(expected), Some(actual)) if expected == actual => CheckpointStatus::Valid,
            (Some(_), Some(_)) => CheckpointStatus::Invalid,
        };
        Self { index, status }
    }

    /// False if the candidate diverged from or fell behind the control at
    /// this index. A checkpoint only the candidate published is not held
    /// against it.
    pub fn is_valid(&self) -> bool {
        matches!(
            self.status,
            CheckpointStatus::Valid | CheckpointStatus::Extra
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn metric_statuses() {
        let a = Some(H256::repeat_byte(1));
        let b = Some(H256::repeat_byte(2));
        assert_eq!(CheckpointMetric::compare(0, a, a).status, CheckpointStatus::Valid);
        assert_eq!(CheckpointMetric::compare(0, a, b).status, CheckpointStatus::Invalid);
        assert_eq!(CheckpointMetric::compare(0, a, None).status, CheckpointStatus::Missing);
        assert_eq!(CheckpointMetric::compare(0, None, None).status, CheckpointStatus::Missing);
        assert_eq!(CheckpointMetric::compare(0, None, b).status, CheckpointStatus::Extra);
        assert!(CheckpointMetric::compare(0, None, b).is_valid());
        assert!(!CheckpointMetric::compare(0, a, None).is_valid());
        assert_eq!(
            serde_json::to_string(&CheckpointMetric::compare(7, a, a)).unwrap(),
            r#"{"index":7,"status":"VALID"}"#
        );
    }

    #[test]
    fn signed_checkpoint_json() {
        let json = r#"{
            "value": {
                "mailbox_address": "0x000000000000000000000000cc737a94fecaec165abcf12ded095bb13f037685",
                "mailbox_domain": 44787,
                "root": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "index": 12
            },
            "signature": {
                "r": "0x1",
                "s": "0x2",
                "v": 27
            }
        }"#;
        let signed: SignedCheckpoint = serde_json::from_str(json).unwrap();
        assert_eq!(signed.value.index, 12);
        assert_eq!(signed.value.mailbox_domain, 44787);
        assert_eq!(signed.value.root, H256::repeat_byte(0x11));
    }
}
