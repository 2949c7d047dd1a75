//! Reproducible keys for infrastructure contracts whose addresses must be the
//! same on every chain, derived from the deployer key.

use std::str::FromStr;

use coins_bip32::path::DerivationPath;
use coins_bip32::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use eyre::{Context as _, Result};
use serde::Deserialize;
use strum::{EnumIter, EnumString};
use tracing::{debug, instrument};

use hyperlane_infra_core::Context;

use crate::SecretStore;

/// Infrastructure roles with a deterministic key. The discriminant is the
/// account level of the derivation path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, EnumIter, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
#[repr(u32)]
pub enum DeterministicKeyRole {
    /// Deploys interchain account routers
    InterchainAccount = 0,
    /// Deploys test recipients
    TestRecipient = 1,
    /// Deploys the CREATE2 factory
    Create2Factory = 2,
}

/// Nonce of the key currently in use per role. Bumping a nonce rotates the
/// key and therefore the deployed addresses.
pub type NonceTable = [(DeterministicKeyRole, u32)];

/// Nonces in use today
pub const DETERMINISTIC_NONCES: &NonceTable = &[
    (DeterministicKeyRole::InterchainAccount, 0),
    (DeterministicKeyRole::TestRecipient, 0),
    (DeterministicKeyRole::Create2Factory, 0),
];

/// Nonce of `role` in `nonces`, zero when the role is not listed
pub fn nonce_for(nonces: &NonceTable, role: DeterministicKeyRole) -> u32 {
    nonces
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, nonce)| *nonce)
        .unwrap_or_default()
}

/// BIP-32 path of a role's key
pub fn derivation_path(role: DeterministicKeyRole, nonce: u32) -> String {
    format!("m/44'/60'/0'/{}/{}", role as u32, nonce)
}

/// Derive the key of `role` at `nonce` from `seed`.
pub fn derive(seed: &[u8], role: DeterministicKeyRole, nonce: u32) -> Result<LocalWallet> {
    let path = DerivationPath::from_str(&derivation_path(role, nonce))?;
    let derived = XPriv::root_from_seed(seed, None)?.derive_path(&path)?;
    let key: &SigningKey = derived.as_ref();
    Ok(LocalWallet::from_bytes(&key.to_bytes())?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployerKeySecret {
    private_key: String,
}

/// Name of the secret holding the deployer key
pub fn deployer_secret_name(environment: &str, context: Context) -> String {
    format!("{context}-{environment}-key-deployer")
}

/// The deployer private key, which seeds every deterministic key.
pub async fn deployer_seed(
    secrets: &dyn SecretStore,
    environment: &str,
    context: Context,
) -> Result<Vec<u8>> {
    let name = deployer_secret_name(environment, context);
    let secret: DeployerKeySecret = serde_json::from_str(&secrets.access(&name).await?)
        .with_context(|| format!("Secret {name} is not a deployer key"))?;
    hex::decode(secret.private_key.trim_start_matches("0x"))
        .with_context(|| format!("Secret {name} holds an invalid private key"))
}

/// The deterministic key of `role` for an environment, at the nonce `nonces`
/// lists for it.
#[instrument(skip(secrets, nonces))]
pub async fn deterministic_key(
    secrets: &dyn SecretStore,
    environment: &str,
    context: Context,
    role: DeterministicKeyRole,
    nonces: &NonceTable,
) -> Result<LocalWallet> {
    let seed = deployer_seed(secrets, environment, context).await?;
    let nonce = nonce_for(nonces, role);
    let wallet = derive(&seed, role, nonce)?;
    debug!(nonce, address = ?wallet.address(), "Derived deterministic key");
    Ok(wallet)
}
