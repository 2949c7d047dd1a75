//! This crate contains the plain data model shared by the Hyperlane infra
//! tooling: chain identifiers, checkpoints, matching lists and the policy types
//! that agent configs are compiled from.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub use ethers_core::types::{Address, Signature, H160, H256, U256};

mod chain;
pub use chain::*;

mod error;
pub use error::*;

mod gas;
pub use gas::*;

mod key;
pub use key::*;

/// Message filtering lists consumed by relayers
pub mod matching_list;
pub use matching_list::{MatchingList, MATCHING_LIST_ALL_WILDCARDS};

mod overrides;
pub use overrides::*;

#[doc(hidden)]
pub use paste;

mod types;
pub use types::*;
