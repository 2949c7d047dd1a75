use serde::{Deserialize, Serialize};

use crate::matching_list::MatchingListConf;
use crate::U256;

/// Policy governing whether a relayer requires proof of gas payment before
/// relaying a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GasPaymentEnforcementPolicy {
    /// No requirement - all messages are processed regardless of gas payment
    #[default]
    None,
    /// Messages that have paid a minimum amount will be processed
    Minimum {
        /// Minimum payment in the origin chain's native token (wei)
        #[serde(with = "decimal_u256")]
        payment: U256,
    },
    /// The required amount of gas on the foreign chain has been paid according
    /// to an off-chain price oracle.
    MeetsEstimatedCost,
}

/// Gas payment enforcement as declared in an environment config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPaymentEnforcementConf {
    /// The gas payment enforcement policy
    pub policy: GasPaymentEnforcementPolicy,
    /// Messages matching this list are relayed regardless of the policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<MatchingListConf>,
}

/// Gas payment enforcement as handed to the relayer, with the whitelist in its
/// string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableGasPaymentEnforcementConf {
    /// The gas payment enforcement policy
    pub policy: GasPaymentEnforcementPolicy,
    /// JSON encoded matching list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
}

/// (De)serialize a `U256` as a decimal string. Numbers and `0x` prefixed hex
/// strings are also accepted when reading.
pub mod decimal_u256 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::U256;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    /// Serialize as a decimal string
    pub fn serialize<S: Serializer>(v: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    /// Deserialize from a number, a decimal string or a hex string
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Int(i) => Ok(U256::from(i)),
            Raw::Str(s) => match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).map_err(D::Error::custom),
                None => U256::from_dec_str(&s).map_err(D::Error::custom),
            },
        }
    }
}
