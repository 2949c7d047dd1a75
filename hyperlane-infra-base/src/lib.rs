//! Building blocks of the Hyperlane infra tooling: environment settings,
//! checkpoint storage, cloud provisioning and secrets, the agent config
//! compiler and the checkpoint consistency verifier.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub mod settings;

pub mod compiler;

pub mod deterministic_keys;

pub mod provisioning;

mod secrets;
pub use secrets::*;

mod traits;
pub use traits::*;

mod types;
pub use types::*;

pub mod verifier;
