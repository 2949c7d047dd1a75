#![allow(missing_docs)]

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::InfraError;

/// All chains the infra tooling knows how to configure agents for. The
/// discriminant is the Hyperlane domain id of the chain.
#[derive(
    FromPrimitive,
    EnumString,
    strum::Display,
    EnumIter,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Clone,
    Copy,
    Hash,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum ChainName {
    Ethereum = 1,
    Goerli = 5,

    Polygon = 137,
    Mumbai = 80001,

    Avalanche = 43114,
    Fuji = 43113,

    Arbitrum = 42161,
    ArbitrumGoerli = 421613,

    Optimism = 10,
    OptimismGoerli = 420,

    Bsc = 56,
    BscTestnet = 97,

    Celo = 42220,
    Alfajores = 44787,

    Moonbeam = 1284,
    MoonbaseAlpha = 1287,

    Gnosis = 100,

    // -- Local test chains --
    /// Test1 local chain
    Test1 = 13371,
    /// Test2 local chain
    Test2 = 13372,
    /// Test3 local chain
    Test3 = 13373,
}

/// Types of chains.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ChainType {
    /// A mainnet.
    Mainnet,
    /// A testnet.
    Testnet,
    /// A local chain for testing (i.e. Hardhat node).
    LocalTestChain,
}

impl ChainName {
    /// The Hyperlane domain id of this chain
    pub fn domain_id(&self) -> u32 {
        *self as u32
    }

    pub fn chain_type(&self) -> ChainType {
        use ChainName::*;
        use ChainType::*;

        match self {
            Ethereum | Polygon | Avalanche | Arbitrum | Optimism | Bsc | Celo | Moonbeam
            | Gnosis => Mainnet,
            Goerli | Mumbai | Fuji | ArbitrumGoerli | OptimismGoerli | BscTestnet
            | Alfajores | MoonbaseAlpha => Testnet,
            Test1 | Test2 | Test3 => LocalTestChain,
        }
    }
}

impl From<ChainName> for u32 {
    fn from(chain: ChainName) -> Self {
        chain as u32
    }
}

impl TryFrom<u32> for ChainName {
    type Error = InfraError;

    fn try_from(domain_id: u32) -> Result<Self, Self::Error> {
        FromPrimitive::from_u32(domain_id).ok_or(InfraError::UnknownDomainId(domain_id))
    }
}

impl PartialEq<u32> for ChainName {
    fn eq(&self, other: &u32) -> bool {
        (*self as u32).eq(other)
    }
}
